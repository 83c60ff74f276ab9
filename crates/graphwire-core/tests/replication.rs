//! # Replication Tests
//!
//! End-to-end tests of the replication machinery: graphs mirroring graphs,
//! pipes crossing thread boundaries, and time guards suppressing echoes.

use graphwire_core::{
    AttrValue, BoundaryPipe, ElementRef, Event, Graph, GraphwireError, PipeCapacity, Sink, Source,
    SourceId, StampedEvent, sink_handle,
};
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

/// Records every event, in order.
#[derive(Default)]
struct EventLog {
    events: Vec<StampedEvent>,
}

impl Sink for EventLog {
    fn node_added(&mut self, origin: &SourceId, time: u64, id: &str) -> Result<(), GraphwireError> {
        self.events.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::NodeAdded { id: id.to_string() },
        ));
        Ok(())
    }

    fn node_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.events.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::NodeRemoved { id: id.to_string() },
        ));
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
        self.events.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::EdgeAdded {
                id: id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                directed,
            },
        ));
        Ok(())
    }

    fn edge_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.events.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::EdgeRemoved { id: id.to_string() },
        ));
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
        self.events.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::AttributeChanged {
                element: element.clone(),
                key: key.to_string(),
                old: old.cloned(),
                new: new.cloned(),
            },
        ));
        Ok(())
    }

    fn graph_cleared(&mut self, origin: &SourceId, time: u64) -> Result<(), GraphwireError> {
        self.events
            .push(StampedEvent::new(origin.clone(), time, Event::GraphCleared));
        Ok(())
    }
}

/// Drive a few typical mutations on a graph.
fn mutate(g: &mut Graph) -> usize {
    g.add_node("A").expect("add");
    g.add_node("B").expect("add");
    g.add_node("C").expect("add");
    g.add_edge("AB", "A", "B", false).expect("edge");
    g.add_edge("AC", "A", "C", true).expect("edge");
    g.set_attribute(&ElementRef::node("A"), "int", Some(AttrValue::Int(1)))
        .expect("set");
    g.remove_edge("AB").expect("remove");
    7
}

// =============================================================================
// MIRRORING
// =============================================================================

#[test]
fn direct_mirror_converges() {
    let mut g1 = Graph::new("g1");
    let g2 = sink_handle(Graph::new("g2"));
    g1.add_sink(g2.clone());

    mutate(&mut g1);

    let mirror = g2.lock().expect("lock");
    assert_eq!(mirror.node_count(), g1.node_count());
    assert_eq!(mirror.edge_count(), g1.edge_count());
    assert_eq!(mirror.node_attribute("A", "int"), Some(&AttrValue::Int(1)));
    assert!(mirror.contains_edge("AC"));
    assert!(!mirror.contains_edge("AB"));
}

#[test]
fn bidirectional_mirror_is_loop_free() {
    // g1 and g2 feed each other through pipes; without echo suppression
    // every event would bounce forever.
    let mut g1 = Graph::new("g1");
    let mut g2 = Graph::new("g2");

    let mut pipe_ab = BoundaryPipe::new(PipeCapacity::Unbounded);
    let mut pipe_ba = BoundaryPipe::new(PipeCapacity::Unbounded);
    pipe_ab.attach(&mut g1);
    pipe_ba.attach(&mut g2);

    let mutations = mutate(&mut g1);

    // Alternate pumping until both directions go quiet.
    let mut applied_on_g2 = 0usize;
    loop {
        let forward = {
            let mut n = 0usize;
            while pipe_ab.pump_into(&mut g2).expect("pump") {
                n += 1;
            }
            n
        };
        let back = {
            let mut n = 0usize;
            while pipe_ba.pump_into(&mut g1).expect("pump") {
                n += 1;
            }
            n
        };
        applied_on_g2 += forward;
        if forward == 0 && back == 0 {
            break;
        }
    }

    // Every mutation crossed exactly once; the echoes died at g1's guard.
    assert_eq!(applied_on_g2, mutations);
    assert_eq!(g1.dropped_events(), mutations as u64);
    assert_eq!(g1.node_count(), g2.node_count());
    assert_eq!(g1.edge_count(), g2.edge_count());
}

#[test]
fn replayed_stream_is_idempotent() {
    let mut g1 = Graph::new("g1");
    let log = sink_handle(EventLog::default());
    g1.add_sink(log.clone());
    mutate(&mut g1);

    let mut g2 = Graph::new("g2");
    let events: Vec<StampedEvent> = log.lock().expect("lock").events.clone();

    // Deliver the full stream twice; the second pass is all duplicates.
    for ev in &events {
        graphwire_core::dispatch_event(&mut g2, ev).expect("apply");
    }
    let nodes_after_first = g2.node_count();
    let edges_after_first = g2.edge_count();

    for ev in &events {
        graphwire_core::dispatch_event(&mut g2, ev).expect("apply");
    }

    assert_eq!(g2.node_count(), nodes_after_first);
    assert_eq!(g2.edge_count(), edges_after_first);
    assert_eq!(g2.dropped_events(), events.len() as u64);
}

#[test]
fn mirror_preserves_event_order_and_stamps() {
    let mut g1 = Graph::new("g1");
    let g2 = sink_handle(Graph::new("g2"));
    let downstream = sink_handle(EventLog::default());
    g2.lock().expect("lock").add_sink(downstream.clone());
    g1.add_sink(g2.clone());

    mutate(&mut g1);

    let events = &downstream.lock().expect("lock").events;
    assert_eq!(events.len(), 7);
    // All stamps carry the origin, and times strictly increase.
    let origin = SourceId::new("g1");
    for pair in events.windows(2) {
        assert_eq!(pair[0].origin, origin);
        assert!(pair[0].time < pair[1].time);
    }
}

// =============================================================================
// REMOVAL ORDERING
// =============================================================================

#[test]
fn node_removal_streams_incident_edges_first() {
    let mut g1 = Graph::new("g1");
    g1.add_node("A").expect("add");
    g1.add_node("B").expect("add");
    g1.add_edge("AB", "A", "B", false).expect("edge");

    let log = sink_handle(EventLog::default());
    g1.add_sink(log.clone());
    g1.remove_node("B").expect("remove");

    let events = &log.lock().expect("lock").events;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].event, Event::EdgeRemoved { ref id } if id == "AB"));
    assert!(matches!(events[1].event, Event::NodeRemoved { ref id } if id == "B"));

    // A mirror consuming this stream never sees a dangling edge.
    let mut g2 = Graph::new("g2");
    for ev in events {
        graphwire_core::dispatch_event(&mut g2, ev).expect("apply");
    }
}

// =============================================================================
// SNAPSHOT REPLAY
// =============================================================================

#[test]
fn snapshot_replay_reconstructs_live_graph() {
    let mut g1 = Graph::new("g1");
    g1.add_node("A").expect("add");
    g1.add_node("B").expect("add");
    g1.add_edge("AB", "A", "B", false).expect("edge");
    g1.set_attribute(&ElementRef::node("A"), "int", Some(AttrValue::Int(1)))
        .expect("set");
    g1.set_attribute(&ElementRef::graph(), "name", Some(AttrValue::from("demo")))
        .expect("set");

    let mut g2 = Graph::new("g2");
    g1.replay_into(&mut g2).expect("replay");

    assert_eq!(g2.node_count(), 2);
    assert_eq!(g2.edge_count(), 1);
    assert_eq!(g2.node_attribute("A", "int"), Some(&AttrValue::Int(1)));
    assert_eq!(g2.graph_attribute("name"), Some(&AttrValue::from("demo")));
}

#[test]
fn consecutive_replays_use_distinct_origins() {
    let mut g1 = Graph::new("g1");
    g1.add_node("A").expect("add");

    // Two replays into the same target: the second must not be shadowed
    // by the first replay's stamps.
    let mut target = Graph::new("t");
    g1.replay_into(&mut target).expect("replay");
    target.clear();
    g1.replay_into(&mut target).expect("replay");

    assert_eq!(target.node_count(), 1);
    assert_eq!(target.dropped_events(), 0);
}

// =============================================================================
// PIPE BOUNDARY
// =============================================================================

#[test]
fn pipe_decouples_producer_from_consumer_thread() {
    let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
    let input = pipe.input();

    let producer = std::thread::spawn(move || {
        let mut g = Graph::new("g1");
        g.add_sink(input);
        mutate(&mut g)
    });
    let mutations = producer.join().expect("join");

    let mut mirror = Graph::new("mirror");
    let mut pumped = 0usize;
    while pipe.pump_into(&mut mirror).expect("pump") {
        pumped += 1;
    }

    assert_eq!(pumped, mutations);
    assert_eq!(mirror.node_count(), 3);
    assert_eq!(mirror.edge_count(), 1);
    assert_eq!(mirror.node_attribute("A", "int"), Some(&AttrValue::Int(1)));
}
