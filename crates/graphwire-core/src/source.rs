//! # Source Contract
//!
//! A source is a producer of graph mutation events. It owns an explicit,
//! injected collection of subscribed sinks — there is no ambient registry.
//! Dispatch is best-effort synchronous: one sink's failure is reported to
//! the caller-supplied error hook and never prevents delivery to the
//! remaining sinks.

use crate::event::StampedEvent;
use crate::sink::{SinkHandle, dispatch_event};
use crate::types::GraphwireError;
use std::sync::Arc;

// =============================================================================
// SOURCE TRAIT
// =============================================================================

/// Producer of graph mutation events.
///
/// `add_element_sink` / `add_attribute_sink` register capability-narrowed
/// subscriptions: the sink only receives the named event family.
pub trait Source {
    /// Subscribe a sink to all events. Duplicate handles are rejected.
    fn add_sink(&mut self, sink: SinkHandle) -> bool;

    /// Subscribe a sink to element-lifecycle events only
    /// (add/remove, clear, step).
    fn add_element_sink(&mut self, sink: SinkHandle) -> bool;

    /// Subscribe a sink to attribute events only.
    fn add_attribute_sink(&mut self, sink: SinkHandle) -> bool;

    /// Unsubscribe a sink. Safe relative to an in-flight dispatch: the
    /// detaching sink either finishes the current event or is skipped.
    fn remove_sink(&mut self, sink: &SinkHandle) -> bool;
}

// =============================================================================
// ERROR HOOK
// =============================================================================

/// Channel for dispatch-time errors. The default hook logs at warn level.
pub type ErrorHook = Arc<dyn Fn(&GraphwireError) + Send + Sync>;

fn default_error_hook() -> ErrorHook {
    Arc::new(|err| {
        tracing::warn!(error = %err, "sink failed during event dispatch");
    })
}

// =============================================================================
// SINK SET
// =============================================================================

/// One registered subscription.
struct SinkEntry {
    handle: SinkHandle,
    /// Receives element-lifecycle events (add/remove, clear, step).
    elements: bool,
    /// Receives attribute-change events.
    attributes: bool,
}

/// The ordered-insertion collection of subscribed sinks a source owns.
///
/// Dispatch iterates a snapshot of the registration list, so removing a
/// sink between events never invalidates an in-flight fan-out.
pub struct SinkSet {
    entries: Vec<SinkEntry>,
    on_error: ErrorHook,
}

impl Default for SinkSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl SinkSet {
    /// Create an empty sink set with the default (logging) error hook.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            on_error: default_error_hook(),
        }
    }

    /// Replace the error hook. Applies to subsequent dispatches.
    pub fn set_error_hook(&mut self, hook: ErrorHook) {
        self.on_error = hook;
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, sink: &SinkHandle) -> bool {
        self.entries
            .iter()
            .any(|e| Arc::ptr_eq(&e.handle, sink))
    }

    fn add(&mut self, sink: SinkHandle, elements: bool, attributes: bool) -> bool {
        if self.contains(&sink) {
            return false;
        }
        self.entries.push(SinkEntry {
            handle: sink,
            elements,
            attributes,
        });
        true
    }

    /// Register a full-capability sink. Returns false on duplicate.
    pub fn add_sink(&mut self, sink: SinkHandle) -> bool {
        self.add(sink, true, true)
    }

    /// Register an element-lifecycle-only sink.
    pub fn add_element_sink(&mut self, sink: SinkHandle) -> bool {
        self.add(sink, true, false)
    }

    /// Register an attribute-only sink.
    pub fn add_attribute_sink(&mut self, sink: SinkHandle) -> bool {
        self.add(sink, false, true)
    }

    /// Unregister a sink by handle identity. Returns false if absent.
    pub fn remove_sink(&mut self, sink: &SinkHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !Arc::ptr_eq(&e.handle, sink));
        self.entries.len() < before
    }

    /// Fan a stamped event out to every matching sink, in registration
    /// order. Each dispatch is isolated: an error goes to the hook and
    /// delivery continues.
    pub fn dispatch(&self, ev: &StampedEvent) {
        let wants_attributes = ev.event.is_attribute();

        // Snapshot so a removal triggered mid-fan-out cannot invalidate
        // the iteration.
        let snapshot: Vec<SinkHandle> = self
            .entries
            .iter()
            .filter(|e| {
                if wants_attributes {
                    e.attributes
                } else {
                    e.elements
                }
            })
            .map(|e| Arc::clone(&e.handle))
            .collect();

        for handle in snapshot {
            let result = match handle.lock() {
                Ok(mut sink) => dispatch_event(&mut *sink, ev),
                Err(_) => Err(GraphwireError::Dispatch(
                    "sink mutex poisoned; skipping delivery".to_string(),
                )),
            };
            if let Err(err) = result {
                (self.on_error)(&err);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
