//! Clamp Controller - Per-element truncation lifecycle.
//!
//! A [`Clamp`] owns the truncation of one element: it keeps the original
//! text, resolves options from defaults, programmatic input, and element
//! attributes, and re-clamps on viewport resizes after a debounce.
//!
//! Clamping itself takes one of two paths, decided by the document's
//! [`native_line_clamp`](crate::dom::DocumentConfig) capability. Native
//! renderers get the full text plus a `line-clamp` style and truncate at
//! paint time. Everything else gets the manual path: measure, then strip
//! trailing words until the text fits the allowed height.
//!
//! Controllers register themselves in a per-thread side table keyed by
//! node, which is what makes double-binding detectable and
//! [`controller_of`] possible. Entries hold the state weakly; dropping
//! every handle unregisters the element.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::dom::{self, NodeId};
use crate::error::{Error, Result};
use crate::layout::measure_height;
use crate::options::{
    from_attributes, ClampOptions, ResolvedOptions, BREAKPOINTS_ATTRIBUTE, LINES_ATTRIBUTE,
};
use crate::timers::{self, TimerId};
use crate::viewport::{self, ResizeHandle};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Quiet period after the last resize event before re-clamping runs.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);

/// Appended where text has been shortened.
pub const ELLIPSIS: &str = "…";

// =============================================================================
// SIDE TABLE
// =============================================================================

thread_local! {
    /// Node → controller back-references. Weak, so the table never keeps
    /// a controller alive on its own.
    static BINDINGS: RefCell<HashMap<NodeId, Weak<RefCell<ControllerState>>>> =
        RefCell::new(HashMap::new());
}

/// Look up the live controller bound to `element`, if any.
///
/// Stale entries left by controllers dropped without [`Clamp::destroy`]
/// are cleaned up on the way.
pub fn controller_of(element: NodeId) -> Option<Clamp> {
    BINDINGS.with(|b| {
        let mut bindings = b.borrow_mut();
        let weak = bindings.get(&element)?;
        match weak.upgrade() {
            Some(state) => Some(Clamp { state }),
            None => {
                bindings.remove(&element);
                None
            }
        }
    })
}

/// Drop all controller bindings (for testing).
pub fn reset_bindings() {
    BINDINGS.with(|b| b.borrow_mut().clear());
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug)]
struct ControllerState {
    element: NodeId,
    original_content: String,
    resolved: ResolvedOptions,
    resize_handle: Option<ResizeHandle>,
    debounce: TimerId,
    destroyed: bool,
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        // Last handle gone without destroy(): stop external callbacks and
        // free the element for rebinding. Text is not restored.
        if !self.destroyed {
            if let Some(handle) = self.resize_handle.take() {
                viewport::unsubscribe(handle);
            }
            timers::cancel(self.debounce);
            BINDINGS.with(|b| b.borrow_mut().remove(&self.element));
        }
    }
}

/// Truncation controller bound to a single element.
///
/// Cloning shares the controller. [`Clamp::destroy`] tears it down and
/// restores the element's original text.
#[derive(Debug, Clone)]
pub struct Clamp {
    state: Rc<RefCell<ControllerState>>,
}

impl Clamp {
    /// Bind a controller to `element` and clamp it immediately.
    ///
    /// Options resolve in layers: built-in defaults, then `options`, then
    /// the element's `clamp-lines` / `clamp-breakpoints` attributes. The
    /// baseline styles (`overflow: hidden`, `word-break: break-word`, and
    /// `display: block-clamp` on native renderers) are applied, and a
    /// debounced resize subscription keeps the clamp current.
    ///
    /// Fails with [`Error::AlreadyClamped`] when the element already has
    /// a live controller and with [`Error::InvalidAttribute`] when an
    /// attribute does not parse. Nothing is modified in either case.
    pub fn new(element: NodeId, options: Option<ClampOptions>) -> Result<Clamp> {
        if controller_of(element).is_some() {
            return Err(Error::AlreadyClamped(element));
        }

        let attribute_options = from_attributes(
            dom::attribute(element, LINES_ATTRIBUTE).as_deref(),
            dom::attribute(element, BREAKPOINTS_ATTRIBUTE).as_deref(),
        )?;
        let resolved = options
            .unwrap_or_default()
            .layered(&attribute_options)
            .resolve();

        let state = Rc::new(RefCell::new(ControllerState {
            element,
            original_content: dom::text(element),
            resolved,
            resize_handle: None,
            debounce: timers::create_timer(),
            destroyed: false,
        }));
        BINDINGS.with(|b| b.borrow_mut().insert(element, Rc::downgrade(&state)));

        let clamp = Clamp { state };
        clamp.apply_base_styles();
        clamp.excerpt();
        clamp.watch();

        #[cfg(feature = "tracing")]
        tracing::debug!(element = element.index(), "clamp bound");

        Ok(clamp)
    }

    /// The element this controller is bound to.
    pub fn element(&self) -> NodeId {
        self.state.borrow().element
    }

    /// The untruncated source text.
    pub fn content(&self) -> String {
        self.state.borrow().original_content.clone()
    }

    /// The resolved options in effect.
    pub fn options(&self) -> ResolvedOptions {
        self.state.borrow().resolved.clone()
    }

    /// Replace the source text and re-clamp from it.
    pub fn set_content(&self, content: &str) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.original_content = content.to_string();
        }
        self.excerpt();
    }

    /// Replace the options wholesale and re-clamp immediately.
    ///
    /// The new options resolve against the built-in defaults only.
    /// Element attributes were folded in at bind time and are not
    /// re-read here.
    pub fn set_options(&self, options: ClampOptions) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.resolved = options.resolve();
        }
        self.excerpt();
    }

    /// Re-clamp now, without waiting for a resize.
    pub fn refresh(&self) {
        self.excerpt();
    }

    /// Apply the baseline presentation styles at bind time.
    ///
    /// Native renderers also get `display: block-clamp`, which is what
    /// makes the `line-clamp` style written by the excerpt take effect
    /// at paint time.
    fn apply_base_styles(&self) {
        let element = self.state.borrow().element;
        dom::set_style(element, "overflow", "hidden");
        dom::set_style(element, "word-break", "break-word");
        if dom::config().native_line_clamp {
            dom::set_style(element, "display", "block-clamp");
        }
    }

    /// Re-run truncation from the original text.
    ///
    /// Measures the element's single-line height with a transient probe,
    /// picks the allowed line count for the current viewport width, and
    /// resets the text. Native renderers then just get the `line-clamp`
    /// style; otherwise the text is shortened word by word until its
    /// measured height fits, bottoming out at a bare ellipsis.
    fn excerpt(&self) {
        let (element, original, allowed) = {
            let state = self.state.borrow();
            if state.destroyed {
                return;
            }
            (
                state.element,
                state.original_content.clone(),
                state.resolved.active_lines(viewport::width()),
            )
        };
        if !dom::exists(element) {
            return;
        }

        let probe = dom::insert_probe(element);
        let line_height = measure_height(probe);
        dom::remove_probe(probe);

        dom::set_text(element, &original);

        if dom::config().native_line_clamp {
            dom::set_style(element, "line-clamp", &allowed.to_string());

            #[cfg(feature = "tracing")]
            tracing::trace!(element = element.index(), allowed, "native clamp");
            return;
        }

        let max_height = line_height.saturating_mul(allowed);
        while measure_height(element) > max_height {
            let current = dom::text(element);
            match strip_last_word(&current) {
                Some(shortened) => dom::set_text(element, &shortened),
                None => {
                    dom::set_text(element, ELLIPSIS);
                    break;
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(element = element.index(), allowed, "manual clamp");
    }

    /// Subscribe to viewport resizes, debounced.
    ///
    /// Replaces any previous subscription. The handler holds the state
    /// weakly, so a dropped controller stops scheduling work.
    fn watch(&self) {
        let previous = self.state.borrow_mut().resize_handle.take();
        if let Some(handle) = previous {
            viewport::unsubscribe(handle);
        }

        let weak = Rc::downgrade(&self.state);
        let debounce = self.state.borrow().debounce;
        let handle = viewport::on_resize(move |_, _| {
            let weak = weak.clone();
            timers::schedule(debounce, Instant::now() + DEBOUNCE_INTERVAL, move || {
                if let Some(state) = weak.upgrade() {
                    Clamp { state }.excerpt();
                }
            });
        });
        self.state.borrow_mut().resize_handle = Some(handle);
    }

    /// Tear the controller down: stop watching, cancel any pending
    /// re-clamp, restore the original text, and release the element for
    /// a future bind. Styles applied at bind time stay on the element.
    pub fn destroy(&self) {
        let (element, original, handle, debounce) = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (
                state.element,
                std::mem::take(&mut state.original_content),
                state.resize_handle.take(),
                state.debounce,
            )
        };

        if let Some(handle) = handle {
            viewport::unsubscribe(handle);
        }
        timers::cancel(debounce);

        if dom::exists(element) {
            dom::set_text(element, &original);
        }

        BINDINGS.with(|b| b.borrow_mut().remove(&element));

        #[cfg(feature = "tracing")]
        tracing::debug!(element = element.index(), "clamp destroyed");
    }
}

// =============================================================================
// WORD STRIPPING
// =============================================================================

/// Drop the last word, and any separators before it, leaving a trailing
/// ellipsis. Returns `None` when no earlier word boundary remains, which
/// is the signal to give up and show a bare ellipsis.
fn strip_last_word(text: &str) -> Option<String> {
    // Cut the trailing run of non-whitespace.
    let rest = text.trim_end_matches(|c: char| !c.is_whitespace());
    if rest.is_empty() || !rest.ends_with(|c: char| c.is_whitespace()) {
        return None;
    }

    // Then back over separators: whitespace and punctuation alike.
    let kept = rest.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_');
    Some(format!("{kept}{ELLIPSIS}"))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentConfig;

    fn setup() {
        dom::reset_document();
        viewport::reset_viewport();
        timers::reset_timers();
        reset_bindings();
    }

    fn manual_mode() {
        dom::set_config(DocumentConfig {
            native_line_clamp: false,
        });
    }

    fn paragraph(text: &str) -> NodeId {
        let p = dom::create_element("p");
        dom::append_child(dom::root(), p);
        dom::set_text(p, text);
        p
    }

    // ── strip_last_word ──

    #[test]
    fn test_strip_drops_final_word() {
        assert_eq!(strip_last_word("aa bb cc").as_deref(), Some("aa bb…"));
        assert_eq!(strip_last_word("hello world").as_deref(), Some("hello…"));
    }

    #[test]
    fn test_strip_eats_separators() {
        assert_eq!(strip_last_word("hello, world").as_deref(), Some("hello…"));
        assert_eq!(strip_last_word("hello   world").as_deref(), Some("hello…"));
        assert_eq!(strip_last_word("hello ").as_deref(), Some("hello…"));
    }

    #[test]
    fn test_strip_gives_up_on_single_word() {
        assert_eq!(strip_last_word("hello"), None);
        assert_eq!(strip_last_word(""), None);
        assert_eq!(strip_last_word("…"), None);
    }

    // ── binding ──

    #[test]
    fn test_double_bind_is_an_error() {
        setup();
        let p = paragraph("some text");
        let _clamp = Clamp::new(p, None).unwrap();

        let err = Clamp::new(p, None).unwrap_err();
        assert!(matches!(err, Error::AlreadyClamped(node) if node == p));
    }

    #[test]
    fn test_controller_of_finds_live_binding() {
        setup();
        let p = paragraph("some text");
        assert!(controller_of(p).is_none());

        let clamp = Clamp::new(p, None).unwrap();
        let found = controller_of(p).unwrap();
        assert_eq!(found.element(), clamp.element());
    }

    #[test]
    fn test_invalid_attribute_rejects_bind() {
        setup();
        let p = paragraph("some text");
        dom::set_attribute(p, LINES_ATTRIBUTE, "three");

        let err = Clamp::new(p, None).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { .. }));
        assert!(controller_of(p).is_none());
        // Nothing was touched.
        assert_eq!(dom::text(p), "some text");
        assert_eq!(dom::style(p, "overflow"), None);
    }

    #[test]
    fn test_dropped_controller_frees_element() {
        setup();
        let p = paragraph("some text");
        {
            let _clamp = Clamp::new(p, None).unwrap();
        }
        assert!(controller_of(p).is_none());
        assert!(Clamp::new(p, None).is_ok());
    }

    // ── native path ──

    #[test]
    fn test_native_applies_styles_and_keeps_text() {
        setup();
        let p = paragraph("a rather long paragraph that would wrap many times over");
        let _clamp =
            Clamp::new(p, Some(ClampOptions::new().with_lines(2))).unwrap();

        assert_eq!(
            dom::text(p),
            "a rather long paragraph that would wrap many times over"
        );
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("2"));
        assert_eq!(dom::style(p, "display").as_deref(), Some("block-clamp"));
        assert_eq!(dom::style(p, "overflow").as_deref(), Some("hidden"));
        assert_eq!(dom::style(p, "word-break").as_deref(), Some("break-word"));
    }

    #[test]
    fn test_native_tier_follows_viewport_width() {
        setup();
        let p = paragraph("text");
        let options = ClampOptions::new()
            .with_lines(2)
            .with_breakpoint(40, 3);
        let _clamp = Clamp::new(p, Some(options)).unwrap();

        // Default viewport is 80 columns, so the 40-column tier wins.
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("3"));

        viewport::set_size(30, 24);
        timers::run_due(Instant::now() + DEBOUNCE_INTERVAL);
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("2"));
    }

    // ── manual path ──

    #[test]
    fn test_manual_shrinks_word_by_word() {
        setup();
        manual_mode();
        viewport::set_size(10, 24);
        let p = paragraph("aaaa bbbb cccc dddd");

        let _clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();
        assert_eq!(dom::text(p), "aaaa bbbb…");
        assert_eq!(dom::style(p, "line-clamp"), None);
        assert_eq!(dom::style(p, "display"), None);
    }

    #[test]
    fn test_manual_baseline_styles_skip_native_display() {
        setup();
        manual_mode();
        viewport::set_size(20, 24);
        let p = paragraph("short enough");
        let _clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();

        assert_eq!(dom::style(p, "overflow").as_deref(), Some("hidden"));
        assert_eq!(dom::style(p, "word-break").as_deref(), Some("break-word"));
        assert_eq!(dom::style(p, "display"), None);
    }

    #[test]
    fn test_manual_fitting_text_untouched() {
        setup();
        manual_mode();
        viewport::set_size(20, 24);
        let p = paragraph("short enough");

        let _clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();
        assert_eq!(dom::text(p), "short enough");
    }

    #[test]
    fn test_manual_bottoms_out_at_ellipsis() {
        setup();
        manual_mode();
        viewport::set_size(4, 24);
        let p = paragraph("abcdefgh");

        let _clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();
        assert_eq!(dom::text(p), ELLIPSIS);
    }

    #[test]
    fn test_manual_regrows_on_wider_viewport() {
        setup();
        manual_mode();
        viewport::set_size(10, 24);
        let p = paragraph("aaaa bbbb cccc dddd");
        let _clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();
        assert_eq!(dom::text(p), "aaaa bbbb…");

        // Wide enough for the whole text on one line.
        viewport::set_size(40, 24);
        timers::run_due(Instant::now() + DEBOUNCE_INTERVAL);
        assert_eq!(dom::text(p), "aaaa bbbb cccc dddd");
    }

    // ── options ──

    #[test]
    fn test_attributes_override_programmatic_options() {
        setup();
        let p = paragraph("text");
        dom::set_attribute(p, LINES_ATTRIBUTE, "3");

        let clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(2))).unwrap();
        assert_eq!(clamp.options().lines, 3);
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("3"));
    }

    #[test]
    fn test_breakpoints_attribute_parsed_as_json() {
        setup();
        let p = paragraph("text");
        dom::set_attribute(p, BREAKPOINTS_ATTRIBUTE, r#"{"0": 2, "60": 4}"#);

        let clamp = Clamp::new(p, None).unwrap();
        assert_eq!(clamp.options().active_lines(80), 4);
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("4"));
    }

    #[test]
    fn test_set_options_resolves_fresh_and_ignores_attributes() {
        setup();
        let p = paragraph("text");
        dom::set_attribute(p, LINES_ATTRIBUTE, "3");
        let clamp = Clamp::new(p, None).unwrap();
        assert_eq!(clamp.options().lines, 3);

        clamp.set_options(ClampOptions::new().with_lines(2));
        assert_eq!(clamp.options().lines, 2);
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("2"));
    }

    #[test]
    fn test_set_content_reclamps_from_new_text() {
        setup();
        manual_mode();
        viewport::set_size(10, 24);
        let p = paragraph("aaaa bbbb cccc dddd");
        let clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();

        clamp.set_content("tiny");
        assert_eq!(dom::text(p), "tiny");
        assert_eq!(clamp.content(), "tiny");
    }

    #[test]
    fn test_refresh_restores_clamp_after_external_edit() {
        setup();
        manual_mode();
        viewport::set_size(10, 24);
        let p = paragraph("aaaa bbbb cccc dddd");
        let clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();

        dom::set_text(p, "scribbled over by someone else entirely");
        clamp.refresh();
        assert_eq!(dom::text(p), "aaaa bbbb…");
    }

    // ── resize debounce ──

    #[test]
    fn test_resize_burst_coalesces_into_one_reclamp() {
        setup();
        let p = paragraph("text");
        let options = ClampOptions::new().with_lines(2).with_breakpoint(40, 3);
        let _clamp = Clamp::new(p, Some(options)).unwrap();
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("3"));

        viewport::set_size(30, 24);
        viewport::set_size(35, 24);
        viewport::set_size(20, 24);
        assert_eq!(timers::pending_count(), 1);

        // Still the old tier until the quiet period passes.
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("3"));

        timers::run_due(Instant::now() + DEBOUNCE_INTERVAL);
        assert_eq!(dom::style(p, "line-clamp").as_deref(), Some("2"));
        assert_eq!(timers::pending_count(), 0);
    }

    // ── destroy ──

    #[test]
    fn test_destroy_restores_text_and_frees_element() {
        setup();
        manual_mode();
        viewport::set_size(10, 24);
        let p = paragraph("aaaa bbbb cccc dddd");
        let clamp = Clamp::new(p, Some(ClampOptions::new().with_lines(1))).unwrap();
        assert_eq!(dom::text(p), "aaaa bbbb…");

        clamp.destroy();
        assert_eq!(dom::text(p), "aaaa bbbb cccc dddd");
        assert!(controller_of(p).is_none());
        // Styles stay behind.
        assert_eq!(dom::style(p, "overflow").as_deref(), Some("hidden"));

        assert!(Clamp::new(p, None).is_ok());
    }

    #[test]
    fn test_destroy_cancels_pending_reclamp() {
        setup();
        let p = paragraph("text");
        let clamp = Clamp::new(p, None).unwrap();

        viewport::set_size(30, 24);
        assert_eq!(timers::pending_count(), 1);

        clamp.destroy();
        assert_eq!(timers::pending_count(), 0);
        assert_eq!(timers::run_due(Instant::now() + DEBOUNCE_INTERVAL), 0);
    }

    #[test]
    fn test_destroy_twice_is_harmless() {
        setup();
        let p = paragraph("text");
        let clamp = Clamp::new(p, None).unwrap();
        clamp.destroy();
        clamp.destroy();
        assert!(controller_of(p).is_none());
    }
}
