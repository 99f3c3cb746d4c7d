//! Clamp Set - Selector-driven controller management.
//!
//! A [`ClampSet`] keeps a [`Clamp`] on every element matching a selector:
//! it scans the document once at construction, then follows structural
//! mutation batches to adopt elements entering the tree and destroy
//! controllers for elements leaving it. Elements that already carry a
//! controller, their own or another set's, are left alone.
//!
//! Errors split by phase. The initial scan is configuration the caller
//! just wrote, so a bad attribute fails [`ClampSet::new`] outright and
//! rolls back anything bound so far. The same error on an element that
//! shows up later is logged and skipped; one rogue element does not take
//! the set down.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{self, MutationRecord, NodeId, ObserverHandle, Selector};
use crate::error::Result;
use crate::options::ClampOptions;

use super::controller::{controller_of, Clamp};

// =============================================================================
// SET MANAGER
// =============================================================================

#[derive(Debug)]
struct SetState {
    selector: Selector,
    defaults: ClampOptions,
    tracked: Vec<(NodeId, Clamp)>,
    observer: Option<ObserverHandle>,
    destroyed: bool,
}

impl Drop for SetState {
    fn drop(&mut self) {
        // Last handle gone without destroy(): disconnect from the tree.
        // Controllers are dropped, not destroyed, so text stays as-is.
        if !self.destroyed {
            if let Some(observer) = self.observer.take() {
                dom::unobserve(observer);
            }
        }
    }
}

/// Selector-driven manager that binds a [`Clamp`] to every matching
/// element, now and as the tree changes.
///
/// Cloning shares the set. [`ClampSet::destroy`] tears down every managed
/// controller; dropping the last handle merely disconnects.
#[derive(Debug, Clone)]
pub struct ClampSet {
    state: Rc<RefCell<SetState>>,
}

impl ClampSet {
    /// Scan the document for `selector` matches, bind each one with
    /// `defaults`, and start watching the tree for arrivals and
    /// departures.
    ///
    /// Fails on the first element whose attributes do not parse; anything
    /// bound before the failure is destroyed again, so an `Err` leaves no
    /// trace.
    pub fn new(selector: &str, defaults: Option<ClampOptions>) -> Result<ClampSet> {
        let selector = Selector::parse(selector);
        let defaults = defaults.unwrap_or_default();

        let state = Rc::new(RefCell::new(SetState {
            selector: selector.clone(),
            defaults,
            tracked: Vec::new(),
            observer: None,
            destroyed: false,
        }));
        let set = ClampSet { state };

        for element in dom::query_selector_all(&selector) {
            if let Err(err) = set.adopt(element) {
                set.teardown_tracked();
                return Err(err);
            }
        }

        let weak = Rc::downgrade(&set.state);
        let observer = dom::observe(dom::root(), move |records| {
            if let Some(state) = weak.upgrade() {
                ClampSet { state }.on_mutations(records);
            }
        });
        set.state.borrow_mut().observer = Some(observer);

        #[cfg(feature = "tracing")]
        tracing::debug!(elements = set.len(), "clamp set started");

        Ok(set)
    }

    /// Elements currently managed, in adoption order. Entries whose
    /// nodes have since been freed are pruned on the way.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut state = self.state.borrow_mut();
        state.tracked.retain(|(node, _)| dom::exists(*node));
        state.tracked.iter().map(|(node, _)| *node).collect()
    }

    /// Number of managed elements.
    pub fn len(&self) -> usize {
        self.state.borrow().tracked.len()
    }

    /// Whether the set manages nothing.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().tracked.is_empty()
    }

    /// Tear the whole set down: stop watching the tree and destroy every
    /// managed controller, restoring their original text.
    pub fn destroy(&self) {
        let (observer, tracked) = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (state.observer.take(), std::mem::take(&mut state.tracked))
        };

        if let Some(observer) = observer {
            dom::unobserve(observer);
        }
        for (_, clamp) in tracked {
            clamp.destroy();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("clamp set destroyed");
    }

    /// Bind `element` with the set's defaults, unless something already
    /// owns it.
    fn adopt(&self, element: NodeId) -> Result<()> {
        if controller_of(element).is_some() {
            return Ok(());
        }
        let defaults = self.state.borrow().defaults.clone();
        let clamp = Clamp::new(element, Some(defaults))?;
        self.state.borrow_mut().tracked.push((element, clamp));
        Ok(())
    }

    /// Destroy and forget the controller for an element that left the
    /// tree, if this set owns it.
    fn release(&self, element: NodeId) {
        let clamp = {
            let mut state = self.state.borrow_mut();
            state
                .tracked
                .iter()
                .position(|(node, _)| *node == element)
                .map(|i| state.tracked.remove(i).1)
        };
        if let Some(clamp) = clamp {
            clamp.destroy();
        }
    }

    /// React to one delivered mutation batch.
    fn on_mutations(&self, records: &[MutationRecord]) {
        if self.state.borrow().destroyed {
            return;
        }

        for record in records {
            for &added in &record.added {
                let matched = {
                    let state = self.state.borrow();
                    dom::matches(added, &state.selector)
                };
                if !matched {
                    continue;
                }
                if let Err(_err) = self.adopt(added) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        element = added.index(),
                        error = %_err,
                        "skipping element with unusable clamp attributes"
                    );
                }
            }
            for &removed in &record.removed {
                let matched = {
                    let state = self.state.borrow();
                    dom::matches(removed, &state.selector)
                };
                if matched {
                    self.release(removed);
                }
            }
        }
    }

    /// Destroy everything bound so far (rollback for a failed scan).
    fn teardown_tracked(&self) {
        let tracked = std::mem::take(&mut self.state.borrow_mut().tracked);
        for (_, clamp) in tracked {
            clamp.destroy();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
