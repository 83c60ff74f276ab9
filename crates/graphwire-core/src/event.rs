//! # Event Model
//!
//! Every mutation of a graph becomes exactly one `Event`, stamped with the
//! id of the source that first emitted it and a per-source sequence number.
//! Events are immutable value objects once constructed; each sink receives
//! its own view and no sink can retract an event.

use crate::types::{AttrValue, ElementRef, SourceId};
use serde::{Deserialize, Serialize};

// =============================================================================
// EVENT VARIANTS
// =============================================================================

/// A single graph mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    NodeAdded {
        id: String,
    },
    NodeRemoved {
        id: String,
    },
    EdgeAdded {
        id: String,
        from: String,
        to: String,
        directed: bool,
    },
    EdgeRemoved {
        id: String,
    },
    AttributeChanged {
        element: ElementRef,
        key: String,
        old: Option<AttrValue>,
        new: Option<AttrValue>,
    },
    GraphCleared,
    StepBegun {
        step: f64,
    },
}

impl Event {
    /// Whether this event is delivered to attribute-capable sinks
    /// (as opposed to element-lifecycle sinks).
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::AttributeChanged { .. })
    }

    /// Short name of the variant, for log and error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "node-added",
            Self::NodeRemoved { .. } => "node-removed",
            Self::EdgeAdded { .. } => "edge-added",
            Self::EdgeRemoved { .. } => "edge-removed",
            Self::AttributeChanged { .. } => "attribute-changed",
            Self::GraphCleared => "graph-cleared",
            Self::StepBegun { .. } => "step-begun",
        }
    }
}

// =============================================================================
// STAMPED EVENTS
// =============================================================================

/// An event plus its replication stamp.
///
/// `time` is a sequence number private to `origin`, non-decreasing over that
/// origin's event history. A graph that applies a replicated event re-emits
/// it with the ORIGINAL stamp, which is what lets a downstream time guard
/// recognize the echo when the event loops back to where it started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedEvent {
    pub origin: SourceId,
    pub time: u64,
    pub event: Event,
}

impl StampedEvent {
    /// Stamp an event.
    #[must_use]
    pub fn new(origin: SourceId, time: u64, event: Event) -> Self {
        Self {
            origin,
            time,
            event,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_events_are_classified() {
        let ev = Event::AttributeChanged {
            element: ElementRef::node("A"),
            key: "int".to_string(),
            old: None,
            new: Some(AttrValue::Int(1)),
        };
        assert!(ev.is_attribute());
        assert!(!Event::GraphCleared.is_attribute());
        assert!(
            !Event::NodeAdded {
                id: "A".to_string()
            }
            .is_attribute()
        );
    }
}
