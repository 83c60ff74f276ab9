//! # Property-Based Tests
//!
//! Proptest verification of the replication invariants: per-source stamp
//! monotonicity, guard idempotence, and mirror convergence under arbitrary
//! mutation sequences.

use graphwire_core::{Graph, GraphwireError, Sink, SinkHandle, Source, SourceId, TimeGuard};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

// =============================================================================
// STRATEGIES
// =============================================================================

/// A small mutation script over a bounded id space.
#[derive(Debug, Clone)]
enum Op {
    AddNode(u8),
    RemoveNode(u8),
    AddEdge(u8, u8, bool),
    RemoveEdge(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8).prop_map(Op::AddNode),
        (0u8..8).prop_map(Op::RemoveNode),
        (0u8..8, 0u8..8, any::<bool>()).prop_map(|(a, b, d)| Op::AddEdge(a, b, d)),
        (0u8..8, 0u8..8).prop_map(|(a, b)| Op::RemoveEdge(a, b)),
    ]
}

/// Apply an op, ignoring structural rejections — invalid ops simply do not
/// mutate and do not emit.
fn apply(g: &mut Graph, op: &Op) {
    match op {
        Op::AddNode(n) => {
            let _ = g.add_node(format!("n{n}"));
        }
        Op::RemoveNode(n) => {
            let _ = g.remove_node(&format!("n{n}"));
        }
        Op::AddEdge(a, b, directed) => {
            let _ = g.add_edge(
                format!("e{a}-{b}"),
                &format!("n{a}"),
                &format!("n{b}"),
                *directed,
            );
        }
        Op::RemoveEdge(a, b) => {
            let _ = g.remove_edge(&format!("e{a}-{b}"));
        }
    }
}

// =============================================================================
// STAMP RECORDER
// =============================================================================

/// Collects `(origin, time)` stamps from every event it sees.
#[derive(Default)]
struct StampTrace {
    stamps: Vec<(SourceId, u64)>,
}

impl StampTrace {
    fn record(&mut self, origin: &SourceId, time: u64) {
        self.stamps.push((origin.clone(), time));
    }
}

impl Sink for StampTrace {
    fn node_added(&mut self, origin: &SourceId, time: u64, _id: &str) -> Result<(), GraphwireError> {
        self.record(origin, time);
        Ok(())
    }

    fn node_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        _id: &str,
    ) -> Result<(), GraphwireError> {
        self.record(origin, time);
        Ok(())
    }

    fn edge_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        _id: &str,
        _from: &str,
        _to: &str,
        _directed: bool,
    ) -> Result<(), GraphwireError> {
        self.record(origin, time);
        Ok(())
    }

    fn edge_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        _id: &str,
    ) -> Result<(), GraphwireError> {
        self.record(origin, time);
        Ok(())
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A guard accepts a strictly increasing sequence in full and drops
    /// every repeat of it.
    #[test]
    fn guard_accepts_increasing_and_drops_repeats(times in vec(1u64..10000, 1..50)) {
        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();
        sorted.dedup();

        let origin = SourceId::new("g1");
        let mut guard = TimeGuard::new(true);

        for t in &sorted {
            prop_assert!(guard.accept(&origin, *t));
        }
        for t in &sorted {
            prop_assert!(!guard.accept(&origin, *t));
        }
        prop_assert_eq!(guard.dropped(), sorted.len() as u64);
    }

    /// Interleaved sources do not interfere: each source's acceptance
    /// depends only on its own history.
    #[test]
    fn guard_tracks_sources_independently(times in vec(1u64..1000, 1..30)) {
        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();
        sorted.dedup();

        let a = SourceId::new("a");
        let b = SourceId::new("b");
        let mut guard = TimeGuard::new(true);

        for t in &sorted {
            prop_assert!(guard.accept(&a, *t));
            prop_assert!(guard.accept(&b, *t));
        }
        prop_assert_eq!(guard.last_seen(&a), sorted.last().copied());
        prop_assert_eq!(guard.last_seen(&b), sorted.last().copied());
    }

    /// Every event a graph emits carries its id and a strictly increasing
    /// time, regardless of the mutation sequence.
    #[test]
    fn emitted_stamps_are_monotonic(ops in vec(op_strategy(), 1..60)) {
        let mut g = Graph::new("g1");
        let trace = Arc::new(Mutex::new(StampTrace::default()));
        let handle: SinkHandle = trace.clone();
        g.add_sink(handle);

        for op in &ops {
            apply(&mut g, op);
        }

        let trace = trace.lock().expect("lock");
        let origin = SourceId::new("g1");
        let mut last = 0u64;
        for (src, time) in &trace.stamps {
            prop_assert_eq!(src, &origin);
            prop_assert!(*time > last);
            last = *time;
        }
    }

    /// A mirror fed a graph's event stream converges to the same structure
    /// for any mutation sequence.
    #[test]
    fn mirror_converges_under_arbitrary_mutations(ops in vec(op_strategy(), 1..80)) {
        let mut g1 = Graph::new("g1");
        let g2 = Arc::new(Mutex::new(Graph::new("g2")));
        let handle: SinkHandle = g2.clone();
        g1.add_sink(handle);

        for op in &ops {
            apply(&mut g1, op);
        }

        let mirror = g2.lock().expect("lock");
        prop_assert_eq!(mirror.node_count(), g1.node_count());
        prop_assert_eq!(mirror.edge_count(), g1.edge_count());
        for node in g1.nodes() {
            prop_assert!(mirror.contains_node(node.id()));
            prop_assert_eq!(mirror.degree(node.id()), g1.degree(node.id()));
        }
        for edge in g1.edges() {
            prop_assert!(mirror.contains_edge(edge.id()));
        }
    }

    /// Replaying a snapshot reproduces node and edge sets exactly.
    #[test]
    fn snapshot_replay_matches_source(ops in vec(op_strategy(), 1..60)) {
        let mut g1 = Graph::new("g1");
        for op in &ops {
            apply(&mut g1, op);
        }

        let mut g2 = Graph::new("g2");
        g1.replay_into(&mut g2).expect("replay");

        prop_assert_eq!(g2.node_count(), g1.node_count());
        prop_assert_eq!(g2.edge_count(), g1.edge_count());
        for node in g1.nodes() {
            prop_assert!(g2.contains_node(node.id()));
        }
    }
}
