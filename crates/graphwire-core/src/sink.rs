//! # Sink Contract
//!
//! A sink is a consumer of graph mutation events. The trait has one method
//! per event kind, each with a default no-op body, so a minimal sink
//! implements only the subset it cares about. Capability narrowing
//! (element-only / attribute-only delivery) is decided at registration
//! time, not by the sink type — see [`crate::source::SinkSet`].

use crate::event::{Event, StampedEvent};
use crate::types::{AttrValue, ElementRef, GraphwireError, SourceId};
use std::sync::{Arc, Mutex};

// =============================================================================
// SINK TRAIT
// =============================================================================

/// Consumer of graph mutation events.
///
/// Every method receives the stamp `(origin, time)` of the event it is
/// handling. Implementations that mirror the event onward must preserve
/// that stamp; re-stamping would defeat echo suppression.
///
/// A returned error is reported to the dispatching source's error hook and
/// never interrupts delivery to the remaining sinks.
pub trait Sink: Send {
    fn node_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, id);
        Ok(())
    }

    fn node_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, id);
        Ok(())
    }

    fn edge_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
        from: &str,
        to: &str,
        directed: bool,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, id, from, to, directed);
        Ok(())
    }

    fn edge_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, id);
        Ok(())
    }

    fn attribute_changed(
        &mut self,
        origin: &SourceId,
        time: u64,
        element: &ElementRef,
        key: &str,
        old: Option<&AttrValue>,
        new: Option<&AttrValue>,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, element, key, old, new);
        Ok(())
    }

    fn graph_cleared(&mut self, origin: &SourceId, time: u64) -> Result<(), GraphwireError> {
        let _ = (origin, time);
        Ok(())
    }

    fn step_begun(
        &mut self,
        origin: &SourceId,
        time: u64,
        step: f64,
    ) -> Result<(), GraphwireError> {
        let _ = (origin, time, step);
        Ok(())
    }
}

/// Shared, thread-safe handle to a sink.
///
/// Sinks are identified by handle pointer, so registering the same handle
/// twice on a source is rejected while two distinct sinks of the same type
/// are not confused with each other.
pub type SinkHandle = Arc<Mutex<dyn Sink + Send>>;

/// Wrap a sink value into a handle.
pub fn sink_handle<S: Sink + 'static>(sink: S) -> Arc<Mutex<S>> {
    Arc::new(Mutex::new(sink))
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

/// Route a stamped event to the matching sink method.
///
/// Used everywhere a stored event is re-emitted: boundary pipe pumping,
/// remote adapter decoding, snapshot replay.
pub fn dispatch_event(sink: &mut dyn Sink, ev: &StampedEvent) -> Result<(), GraphwireError> {
    let origin = &ev.origin;
    let time = ev.time;

    match &ev.event {
        Event::NodeAdded { id } => sink.node_added(origin, time, id),
        Event::NodeRemoved { id } => sink.node_removed(origin, time, id),
        Event::EdgeAdded {
            id,
            from,
            to,
            directed,
        } => sink.edge_added(origin, time, id, from, to, *directed),
        Event::EdgeRemoved { id } => sink.edge_removed(origin, time, id),
        Event::AttributeChanged {
            element,
            key,
            old,
            new,
        } => sink.attribute_changed(origin, time, element, key, old.as_ref(), new.as_ref()),
        Event::GraphCleared => sink.graph_cleared(origin, time),
        Event::StepBegun { step } => sink.step_begun(origin, time, *step),
    }
}

// =============================================================================
// TESTS
// =============================================================================
