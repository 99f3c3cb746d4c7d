//! Viewport - Terminal size and resize subscriptions.
//!
//! Thread-local current size plus a resize handler registry. Handlers run
//! synchronously from [`set_size`]; the shell feeds crossterm resize events
//! in, tests call it directly.
//!
//! # API
//!
//! - `width()` / `height()` / `size()` - current viewport in cells
//! - `set_size(w, h)` - store a new size and notify handlers
//! - `on_resize(handler)` - subscribe, returns a [`ResizeHandle`]
//! - `unsubscribe(handle)` - remove a subscription
//! - `reset_viewport()` - reset state for testing

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Size assumed before anything is detected (standard terminal).
const DEFAULT_SIZE: (u16, u16) = (80, 24);

type ResizeFn = Rc<dyn Fn(u16, u16)>;

/// Token returned by [`on_resize`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeHandle(usize);

thread_local! {
    /// Current viewport size (columns, rows).
    static SIZE: RefCell<(u16, u16)> = RefCell::new(DEFAULT_SIZE);

    /// Registered resize handlers, keyed for removal.
    static HANDLERS: RefCell<Vec<(usize, ResizeFn)>> = RefCell::new(Vec::new());

    /// Next handler id.
    static NEXT_HANDLER_ID: Cell<usize> = Cell::new(0);
}

// =============================================================================
// SIZE
// =============================================================================

/// Current viewport width in columns.
pub fn width() -> u16 {
    SIZE.with(|s| s.borrow().0)
}

/// Current viewport height in rows.
pub fn height() -> u16 {
    SIZE.with(|s| s.borrow().1)
}

/// Current viewport size as (columns, rows).
pub fn size() -> (u16, u16) {
    SIZE.with(|s| *s.borrow())
}

/// Store a new viewport size and notify resize handlers.
///
/// Handlers run synchronously against a snapshot of the registry, so a
/// handler may subscribe or unsubscribe during dispatch. An unchanged
/// size notifies nobody.
pub fn set_size(width: u16, height: u16) {
    let changed = SIZE.with(|s| {
        let mut size = s.borrow_mut();
        if *size == (width, height) {
            false
        } else {
            *size = (width, height);
            true
        }
    });
    if !changed {
        return;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(width, height, "viewport resized");

    let handlers: Vec<ResizeFn> =
        HANDLERS.with(|h| h.borrow().iter().map(|(_, f)| f.clone()).collect());
    for handler in handlers {
        handler(width, height);
    }
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// Subscribe to viewport size changes.
pub fn on_resize(handler: impl Fn(u16, u16) + 'static) -> ResizeHandle {
    let id = NEXT_HANDLER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });

    HANDLERS.with(|h| h.borrow_mut().push((id, Rc::new(handler))));
    ResizeHandle(id)
}

/// Remove a resize subscription. Unknown handles are ignored.
pub fn unsubscribe(handle: ResizeHandle) {
    HANDLERS.with(|h| h.borrow_mut().retain(|(id, _)| *id != handle.0));
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Reset viewport size and drop all resize handlers.
pub fn reset_viewport() {
    SIZE.with(|s| *s.borrow_mut() = DEFAULT_SIZE);
    HANDLERS.with(|h| h.borrow_mut().clear());
    NEXT_HANDLER_ID.with(|next| next.set(0));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        reset_viewport();
    }

    #[test]
    fn test_default_size() {
        setup();
        assert_eq!(size(), (80, 24));
        assert_eq!(width(), 80);
        assert_eq!(height(), 24);
    }

    #[test]
    fn test_set_size_updates() {
        setup();
        set_size(120, 40);
        assert_eq!(size(), (120, 40));
    }

    #[test]
    fn test_handlers_notified() {
        setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _handle = on_resize(move |w, h| seen_clone.borrow_mut().push((w, h)));

        set_size(100, 30);
        set_size(60, 20);
        assert_eq!(*seen.borrow(), vec![(100, 30), (60, 20)]);
    }

    #[test]
    fn test_unchanged_size_notifies_nobody() {
        setup();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let _handle = on_resize(move |_, _| count_clone.set(count_clone.get() + 1));

        set_size(80, 24);
        assert_eq!(count.get(), 0);

        set_size(100, 24);
        set_size(100, 24);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        setup();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let handle = on_resize(move |_, _| count_clone.set(count_clone.get() + 1));

        set_size(100, 30);
        unsubscribe(handle);
        set_size(120, 40);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_dispatch() {
        setup();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let handle: Rc<Cell<Option<ResizeHandle>>> = Rc::new(Cell::new(None));
        let handle_clone = handle.clone();

        let h = on_resize(move |_, _| {
            count_clone.set(count_clone.get() + 1);
            if let Some(own) = handle_clone.take() {
                unsubscribe(own);
            }
        });
        handle.set(Some(h));

        set_size(100, 30);
        set_size(120, 40);
        assert_eq!(count.get(), 1);
    }
}
