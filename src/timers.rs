//! Timers - Coalescing one-shot timer queue.
//!
//! Debounce support for clamp controllers: each [`TimerId`] holds at most
//! one pending callback, and re-scheduling replaces the previous deadline,
//! so a burst of resize events collapses into a single firing. The shell
//! pumps [`run_due`] every tick with the current instant; tests drive it
//! with explicit instants instead of sleeping.
//!
//! # API
//!
//! - `create_timer()` - allocate an id
//! - `schedule(id, deadline, callback)` - set or replace the pending shot
//! - `cancel(id)` - drop the pending shot
//! - `run_due(now)` - fire everything whose deadline has passed
//! - `reset_timers()` - clear state for testing

use std::cell::{Cell, RefCell};
use std::time::Instant;

/// Identifies one coalescing timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

struct PendingTimer {
    id: TimerId,
    deadline: Instant,
    callback: Box<dyn FnOnce()>,
}

thread_local! {
    /// Pending one-shot timers, at most one per id.
    static TIMERS: RefCell<Vec<PendingTimer>> = RefCell::new(Vec::new());

    /// Next timer id.
    static NEXT_TIMER_ID: Cell<usize> = Cell::new(0);
}

// =============================================================================
// SCHEDULING
// =============================================================================

/// Allocate a timer id. Ids are never reused within a thread.
pub fn create_timer() -> TimerId {
    NEXT_TIMER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        TimerId(id)
    })
}

/// Schedule `callback` to fire once `deadline` has passed.
///
/// A shot already pending on this id is replaced, deadline and callback
/// both. This is the debounce: reschedule on every event, only the last
/// one fires.
pub fn schedule(id: TimerId, deadline: Instant, callback: impl FnOnce() + 'static) {
    TIMERS.with(|t| {
        let mut timers = t.borrow_mut();
        timers.retain(|timer| timer.id != id);
        timers.push(PendingTimer {
            id,
            deadline,
            callback: Box::new(callback),
        });
    });
}

/// Drop the pending shot for `id`, if any.
pub fn cancel(id: TimerId) {
    TIMERS.with(|t| t.borrow_mut().retain(|timer| timer.id != id));
}

/// Whether `id` has a shot pending.
pub fn is_scheduled(id: TimerId) -> bool {
    TIMERS.with(|t| t.borrow().iter().any(|timer| timer.id == id))
}

/// Number of pending shots across all ids.
pub fn pending_count() -> usize {
    TIMERS.with(|t| t.borrow().len())
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Fire every timer whose deadline is at or before `now`, in deadline
/// order. Returns the number fired.
///
/// Due timers are drained before any callback runs, so a callback that
/// re-schedules waits for a later pump even if its new deadline has
/// already passed.
pub fn run_due(now: Instant) -> usize {
    let mut due: Vec<PendingTimer> = TIMERS.with(|t| {
        let mut timers = t.borrow_mut();
        let mut due = Vec::new();
        let mut i = 0;
        while i < timers.len() {
            if timers[i].deadline <= now {
                due.push(timers.remove(i));
            } else {
                i += 1;
            }
        }
        due
    });

    due.sort_by_key(|timer| timer.deadline);
    let fired = due.len();

    #[cfg(feature = "tracing")]
    if fired > 0 {
        tracing::trace!(fired, "timers fired");
    }

    for timer in due {
        (timer.callback)();
    }
    fired
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Drop all pending timers and reset the id counter.
pub fn reset_timers() {
    TIMERS.with(|t| t.borrow_mut().clear());
    NEXT_TIMER_ID.with(|next| next.set(0));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::time::Duration;

    fn setup() {
        reset_timers();
    }

    #[test]
    fn test_fires_once_deadline_passed() {
        setup();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        let id = create_timer();
        let now = Instant::now();

        schedule(id, now + Duration::from_millis(100), move || {
            fired_clone.set(true)
        });

        assert_eq!(run_due(now), 0);
        assert!(!fired.get());
        assert!(is_scheduled(id));

        assert_eq!(run_due(now + Duration::from_millis(100)), 1);
        assert!(fired.get());
        assert!(!is_scheduled(id));
    }

    #[test]
    fn test_reschedule_replaces_pending_shot() {
        setup();
        let count = Rc::new(Cell::new(0));
        let id = create_timer();
        let now = Instant::now();

        for _ in 0..5 {
            let count_clone = count.clone();
            schedule(id, now + Duration::from_millis(100), move || {
                count_clone.set(count_clone.get() + 1)
            });
        }
        assert_eq!(pending_count(), 1);

        run_due(now + Duration::from_millis(100));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_reschedule_extends_deadline() {
        setup();
        let fired = Rc::new(Cell::new(false));
        let id = create_timer();
        let now = Instant::now();

        let fired_clone = fired.clone();
        schedule(id, now + Duration::from_millis(100), move || {
            fired_clone.set(true)
        });
        let fired_clone = fired.clone();
        schedule(id, now + Duration::from_millis(200), move || {
            fired_clone.set(true)
        });

        run_due(now + Duration::from_millis(150));
        assert!(!fired.get());

        run_due(now + Duration::from_millis(200));
        assert!(fired.get());
    }

    #[test]
    fn test_cancel() {
        setup();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        let id = create_timer();
        let now = Instant::now();

        schedule(id, now, move || fired_clone.set(true));
        cancel(id);

        assert_eq!(run_due(now), 0);
        assert!(!fired.get());
    }

    #[test]
    fn test_fires_in_deadline_order() {
        setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        let now = Instant::now();

        let late = create_timer();
        let early = create_timer();
        let order_clone = order.clone();
        schedule(late, now + Duration::from_millis(50), move || {
            order_clone.borrow_mut().push("late")
        });
        let order_clone = order.clone();
        schedule(early, now + Duration::from_millis(10), move || {
            order_clone.borrow_mut().push("early")
        });

        run_due(now + Duration::from_millis(100));
        assert_eq!(*order.borrow(), vec!["early", "late"]);
    }

    #[test]
    fn test_callback_reschedule_waits_for_next_pump() {
        setup();
        let count = Rc::new(Cell::new(0));
        let id = create_timer();
        let now = Instant::now();

        let count_clone = count.clone();
        schedule(id, now, move || {
            count_clone.set(count_clone.get() + 1);
            let count_inner = count_clone.clone();
            schedule(id, now, move || count_inner.set(count_inner.get() + 1));
        });

        assert_eq!(run_due(now), 1);
        assert_eq!(count.get(), 1);
        assert!(is_scheduled(id));

        assert_eq!(run_due(now), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_ids_are_distinct() {
        setup();
        let a = create_timer();
        let b = create_timer();
        assert_ne!(a, b);
    }
}
