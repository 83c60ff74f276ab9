//! # Boundary Pipe
//!
//! Carries an event stream across a thread boundary. The producer side is
//! an ordinary [`Sink`] handle that enqueues without ever blocking the
//! mutation that triggered the event; the consumer side drains the queue
//! explicitly with [`BoundaryPipe::pump`] and fans the events out to its
//! own sinks, preserving per-producer order and original stamps.
//!
//! A bounded pipe sheds load instead of blocking: once the queue is full,
//! enqueueing fails and the error surfaces through the producing source's
//! error hook. The event is lost; the producer is never stalled.

use crate::config::PipeCapacity;
use crate::event::{Event, StampedEvent};
use crate::graph::Graph;
use crate::sink::{Sink, SinkHandle, dispatch_event};
use crate::source::{SinkSet, Source};
use crate::types::{AttrValue, ElementRef, GraphwireError, SourceId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, mpsc};

// =============================================================================
// PRODUCER SIDE
// =============================================================================

enum PipeQueue {
    Unbounded(Sender<StampedEvent>),
    Bounded(SyncSender<StampedEvent>),
}

/// The sink half of a pipe. Lives on the producer's side of the boundary;
/// every event method serializes its arguments into a [`StampedEvent`] and
/// enqueues it.
pub struct PipeInput {
    queue: PipeQueue,
    open: Arc<AtomicBool>,
    overflow: Arc<AtomicU64>,
}

impl PipeInput {
    fn push(&mut self, ev: StampedEvent) -> Result<(), GraphwireError> {
        // A closed or dropped pipe swallows events silently; the producer
        // has nothing useful to do about it.
        if !self.open.load(Ordering::Acquire) {
            return Ok(());
        }
        match &self.queue {
            PipeQueue::Unbounded(tx) => {
                if tx.send(ev).is_err() {
                    self.open.store(false, Ordering::Release);
                }
                Ok(())
            }
            PipeQueue::Bounded(tx) => match tx.try_send(ev) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(ev)) => {
                    self.overflow.fetch_add(1, Ordering::Relaxed);
                    Err(GraphwireError::Dispatch(format!(
                        "boundary pipe full; dropping {} event from {}",
                        ev.event.kind_name(),
                        ev.origin
                    )))
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.open.store(false, Ordering::Release);
                    Ok(())
                }
            },
        }
    }
}

impl Sink for PipeInput {
    fn node_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::NodeAdded { id: id.to_string() },
        ))
    }

    fn node_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::NodeRemoved { id: id.to_string() },
        ))
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
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::EdgeAdded {
                id: id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                directed,
            },
        ))
    }

    fn edge_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::EdgeRemoved { id: id.to_string() },
        ))
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
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::AttributeChanged {
                element: element.clone(),
                key: key.to_string(),
                old: old.cloned(),
                new: new.cloned(),
            },
        ))
    }

    fn graph_cleared(&mut self, origin: &SourceId, time: u64) -> Result<(), GraphwireError> {
        self.push(StampedEvent::new(origin.clone(), time, Event::GraphCleared))
    }

    fn step_begun(
        &mut self,
        origin: &SourceId,
        time: u64,
        step: f64,
    ) -> Result<(), GraphwireError> {
        self.push(StampedEvent::new(
            origin.clone(),
            time,
            Event::StepBegun { step },
        ))
    }
}

// =============================================================================
// CONSUMER SIDE
// =============================================================================

/// The consumer half of a pipe. Owned by the thread that drains it.
///
/// Events accumulate until [`pump`](Self::pump) is called; pumping never
/// blocks — it drains what is already queued and returns.
pub struct BoundaryPipe {
    input: Arc<Mutex<PipeInput>>,
    open: Arc<AtomicBool>,
    overflow: Arc<AtomicU64>,
    rx: Receiver<StampedEvent>,
    sinks: SinkSet,
}

impl std::fmt::Debug for BoundaryPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryPipe")
            .field("open", &self.open.load(Ordering::Acquire))
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl BoundaryPipe {
    /// Create a pipe with the given queue bound.
    #[must_use]
    pub fn new(capacity: PipeCapacity) -> Self {
        let open = Arc::new(AtomicBool::new(true));
        let overflow = Arc::new(AtomicU64::new(0));
        let (queue, rx) = match capacity {
            PipeCapacity::Unbounded => {
                let (tx, rx) = mpsc::channel();
                (PipeQueue::Unbounded(tx), rx)
            }
            PipeCapacity::Bounded(bound) => {
                let (tx, rx) = mpsc::sync_channel(bound);
                (PipeQueue::Bounded(tx), rx)
            }
        };
        let input = Arc::new(Mutex::new(PipeInput {
            queue,
            open: Arc::clone(&open),
            overflow: Arc::clone(&overflow),
        }));
        Self {
            input,
            open,
            overflow,
            rx,
            sinks: SinkSet::new(),
        }
    }

    /// The producer-side sink handle. Clones of this handle share identity,
    /// so [`detach`](Self::detach) finds the registration made by
    /// [`attach`](Self::attach).
    #[must_use]
    pub fn input(&self) -> SinkHandle {
        // Method-call clone; `Arc::clone` would infer the erased sink type
        // from the return position and reject the concrete argument.
        self.input.clone()
    }

    /// Subscribe this pipe's input to a source.
    pub fn attach(&self, source: &mut dyn Source) -> bool {
        source.add_sink(self.input())
    }

    /// Subscribe to a graph AND stream its current state through the pipe
    /// first, so the consumer starts from a full snapshot instead of an
    /// empty graph.
    pub fn attach_replaying(&self, graph: &mut Graph) -> Result<bool, GraphwireError> {
        let mut input = self
            .input
            .lock()
            .map_err(|_| GraphwireError::Dispatch("pipe input mutex poisoned".to_string()))?;
        graph.replay_into(&mut *input)?;
        drop(input);
        Ok(self.attach(graph))
    }

    /// Unsubscribe this pipe's input from a source and close the producer
    /// end. Already queued events still pump.
    pub fn detach(&self, source: &mut dyn Source) -> bool {
        let removed = source.remove_sink(&self.input());
        if removed {
            self.close();
        }
        removed
    }

    /// Stop accepting events. Already queued events still pump.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Events refused because a bounded queue was full.
    #[must_use]
    pub fn overflowed(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    /// Drain queued events, at most `max` of them (all, when `None`),
    /// dispatching each to this pipe's sinks in arrival order. Returns the
    /// number of events dispatched. Never blocks.
    pub fn pump(&mut self, max: Option<usize>) -> usize {
        let limit = max.unwrap_or(usize::MAX);
        let mut pumped = 0usize;
        while pumped < limit {
            match self.rx.try_recv() {
                Ok(ev) => {
                    self.sinks.dispatch(&ev);
                    pumped = pumped.saturating_add(1);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        pumped
    }

    /// Pump a single event directly into a sink, bypassing the sink set.
    /// Returns false when the queue is empty.
    pub fn pump_into(&mut self, sink: &mut dyn Sink) -> Result<bool, GraphwireError> {
        match self.rx.try_recv() {
            Ok(ev) => {
                dispatch_event(sink, &ev)?;
                Ok(true)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Ok(false),
        }
    }
}

impl Source for BoundaryPipe {
    fn add_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_sink(sink)
    }

    fn add_element_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_element_sink(sink)
    }

    fn add_attribute_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_attribute_sink(sink)
    }

    fn remove_sink(&mut self, sink: &SinkHandle) -> bool {
        self.sinks.remove_sink(sink)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::sink_handle;
    use std::thread;

    #[derive(Default)]
    struct Recorder {
        nodes: Vec<String>,
    }

    impl Sink for Recorder {
        fn node_added(
            &mut self,
            _origin: &SourceId,
            _time: u64,
            id: &str,
        ) -> Result<(), GraphwireError> {
            self.nodes.push(id.to_string());
            Ok(())
        }
    }

    #[test]
    fn events_cross_the_pipe_in_order() {
        let mut g = Graph::new("g1");
        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        pipe.attach(&mut g);

        let recorder = sink_handle(Recorder::default());
        pipe.add_sink(recorder.clone());

        g.add_node("A").expect("add");
        g.add_node("B").expect("add");
        g.add_node("C").expect("add");

        // Nothing delivered until the consumer pumps.
        assert!(recorder.lock().expect("lock").nodes.is_empty());

        assert_eq!(pipe.pump(None), 3);
        assert_eq!(
            recorder.lock().expect("lock").nodes,
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn pump_respects_the_limit() {
        let mut g = Graph::new("g1");
        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        pipe.attach(&mut g);

        g.add_node("A").expect("add");
        g.add_node("B").expect("add");

        assert_eq!(pipe.pump(Some(1)), 1);
        assert_eq!(pipe.pump(Some(1)), 1);
        assert_eq!(pipe.pump(Some(1)), 0);
    }

    #[test]
    fn bounded_pipe_sheds_instead_of_blocking() {
        let mut g = Graph::new("g1");
        let mut pipe = BoundaryPipe::new(PipeCapacity::Bounded(2));
        pipe.attach(&mut g);

        // Third event overflows; the mutation itself still succeeds.
        g.add_node("A").expect("add");
        g.add_node("B").expect("add");
        g.add_node("C").expect("add");

        assert_eq!(g.node_count(), 3);
        assert_eq!(pipe.overflowed(), 1);
        assert_eq!(pipe.pump(None), 2);
    }

    #[test]
    fn closed_pipe_swallows_events() {
        let mut g = Graph::new("g1");
        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        pipe.attach(&mut g);

        g.add_node("A").expect("add");
        pipe.close();
        g.add_node("B").expect("add");

        // The event queued before the close still pumps.
        assert_eq!(pipe.pump(None), 1);
    }

    #[test]
    fn detach_removes_the_attached_registration() {
        let mut g = Graph::new("g1");
        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        assert!(pipe.attach(&mut g));
        assert!(pipe.detach(&mut g));
        assert!(!pipe.detach(&mut g));

        g.add_node("A").expect("add");
        assert_eq!(pipe.pump(None), 0);
    }

    #[test]
    fn attach_replaying_streams_the_snapshot_first() {
        let mut g1 = Graph::new("g1");
        g1.add_node("A").expect("add");
        g1.add_node("B").expect("add");
        g1.add_edge("AB", "A", "B", false).expect("edge");
        g1.set_attribute(&ElementRef::node("A"), "int", Some(AttrValue::Int(1)))
            .expect("set");

        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        pipe.attach_replaying(&mut g1).expect("attach");

        // Live mutation after the snapshot.
        g1.add_node("C").expect("add");

        let mut g2 = Graph::new("g2");
        while pipe.pump_into(&mut g2).expect("pump") {}

        assert_eq!(g2.node_count(), 3);
        assert_eq!(g2.edge_count(), 1);
        assert_eq!(g2.node_attribute("A", "int"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn producer_on_another_thread() {
        let mut pipe = BoundaryPipe::new(PipeCapacity::Unbounded);
        let input = pipe.input();

        let recorder = sink_handle(Recorder::default());
        pipe.add_sink(recorder.clone());

        let producer = thread::spawn(move || {
            let mut g = Graph::new("g1");
            g.add_sink(input);
            for i in 0..100u32 {
                g.add_node(format!("n{i}")).expect("add");
            }
        });
        producer.join().expect("join");

        assert_eq!(pipe.pump(None), 100);
        let nodes = &recorder.lock().expect("lock").nodes;
        assert_eq!(nodes.first().map(String::as_str), Some("n0"));
        assert_eq!(nodes.last().map(String::as_str), Some("n99"));
    }
}
