//! # Remote Adapters
//!
//! Event replication across process boundaries.
//!
//! [`RemoteSink`] is the producer half: a plain [`Sink`] whose events are
//! framed and written to a TCP connection by a dedicated writer task, so
//! the mutating thread never waits on the network. [`RemoteSource`] is the
//! consumer half: it listens for producers, decodes their frames into an
//! internal boundary pipe, and lets the owning thread pump them out.
//!
//! Stamps travel with the events, so the time guards of the receiving
//! graphs keep working exactly as they do in-process.

use crate::registry::{bind_name, lookup_name};
use crate::wire::{read_frame, read_preamble, write_frame, write_preamble};
use graphwire_core::{
    BoundaryPipe, GraphwireError, PipeCapacity, Sink, SinkHandle, Source, StampedEvent,
    dispatch_event,
};
use graphwire_core::{AttrValue, ElementRef, Event, SourceId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// =============================================================================
// REMOTE SINK (producer side)
// =============================================================================

/// A sink that forwards every event to a remote consumer.
///
/// Events are queued to a writer task; a write failure marks the sink
/// failed and every later event is refused with `RemoteDelivery`, which
/// the dispatching source reports through its error hook.
pub struct RemoteSink {
    tx: mpsc::UnboundedSender<StampedEvent>,
    failed: Arc<AtomicBool>,
    peer: SocketAddr,
}

impl std::fmt::Debug for RemoteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSink")
            .field("peer", &self.peer)
            .field("failed", &self.failed.load(Ordering::Acquire))
            .finish()
    }
}

impl RemoteSink {
    /// Resolve `name` through the registry and connect to the consumer
    /// behind it.
    pub async fn connect(registry: SocketAddr, name: &str) -> Result<Self, GraphwireError> {
        let endpoint = lookup_name(registry, name).await?;
        Self::connect_endpoint(endpoint).await
    }

    /// Connect to a consumer endpoint directly.
    pub async fn connect_endpoint(endpoint: SocketAddr) -> Result<Self, GraphwireError> {
        let mut stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| GraphwireError::Io(e.to_string()))?;
        write_preamble(&mut stream).await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<StampedEvent>();
        let failed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed);

        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                // A single unserializable event is dropped; only transport
                // failures take the connection down.
                match write_frame(&mut stream, &ev).await {
                    Ok(()) => {}
                    Err(err @ GraphwireError::Serialization(_)) => {
                        tracing::warn!(%endpoint, error = %err, "dropping unserializable event");
                    }
                    Err(err) => {
                        tracing::warn!(%endpoint, error = %err, "remote sink write failed");
                        flag.store(true, Ordering::Release);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            tx,
            failed,
            peer: endpoint,
        })
    }

    /// Whether the connection has failed. A failed sink stays failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// The consumer endpoint this sink writes to.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn send(&self, ev: StampedEvent) -> Result<(), GraphwireError> {
        if self.is_failed() {
            return Err(GraphwireError::RemoteDelivery(format!(
                "connection to {} lost",
                self.peer
            )));
        }
        self.tx.send(ev).map_err(|_| {
            GraphwireError::RemoteDelivery(format!("writer task for {} stopped", self.peer))
        })
    }
}

impl Sink for RemoteSink {
    fn node_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        self.send(StampedEvent::new(
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
        self.send(StampedEvent::new(
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
        self.send(StampedEvent::new(
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
        self.send(StampedEvent::new(
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
        self.send(StampedEvent::new(
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
        self.send(StampedEvent::new(origin.clone(), time, Event::GraphCleared))
    }

    fn step_begun(
        &mut self,
        origin: &SourceId,
        time: u64,
        step: f64,
    ) -> Result<(), GraphwireError> {
        self.send(StampedEvent::new(
            origin.clone(),
            time,
            Event::StepBegun { step },
        ))
    }
}

// =============================================================================
// REMOTE SOURCE (consumer side)
// =============================================================================

/// A source fed by remote producers.
///
/// Listens on a local endpoint, accepts any number of producers, and
/// funnels their decoded events into a boundary pipe. Nothing is delivered
/// until the owning thread pumps.
pub struct RemoteSource {
    pipe: BoundaryPipe,
    endpoint: SocketAddr,
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RemoteSource {
    /// Listen on `listen` and publish the resulting endpoint as `name` in
    /// the registry.
    pub async fn bind(
        registry: SocketAddr,
        name: &str,
        listen: SocketAddr,
        capacity: PipeCapacity,
    ) -> Result<Self, GraphwireError> {
        let source = Self::listen(listen, capacity).await?;
        bind_name(registry, name, source.endpoint).await?;
        Ok(source)
    }

    /// Listen without registering a name. Producers must be given the
    /// endpoint out of band.
    pub async fn listen(
        listen: SocketAddr,
        capacity: PipeCapacity,
    ) -> Result<Self, GraphwireError> {
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|e| GraphwireError::Io(e.to_string()))?;
        let endpoint = listener
            .local_addr()
            .map_err(|e| GraphwireError::Io(e.to_string()))?;

        let pipe = BoundaryPipe::new(capacity);
        let input = pipe.input();
        tokio::spawn(accept_loop(listener, input));

        Ok(Self { pipe, endpoint })
    }

    /// The endpoint producers connect to.
    #[must_use]
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Events refused because the bounded pipe was full.
    #[must_use]
    pub fn overflowed(&self) -> u64 {
        self.pipe.overflowed()
    }

    /// Drain received events to this source's sinks. Never blocks.
    pub fn pump(&mut self, max: Option<usize>) -> usize {
        self.pipe.pump(max)
    }

    /// Drain one received event directly into a sink.
    pub fn pump_into(&mut self, sink: &mut dyn Sink) -> Result<bool, GraphwireError> {
        self.pipe.pump_into(sink)
    }
}

impl Source for RemoteSource {
    fn add_sink(&mut self, sink: SinkHandle) -> bool {
        self.pipe.add_sink(sink)
    }

    fn add_element_sink(&mut self, sink: SinkHandle) -> bool {
        self.pipe.add_element_sink(sink)
    }

    fn add_attribute_sink(&mut self, sink: SinkHandle) -> bool {
        self.pipe.add_attribute_sink(sink)
    }

    fn remove_sink(&mut self, sink: &SinkHandle) -> bool {
        self.pipe.remove_sink(sink)
    }
}

async fn accept_loop(listener: TcpListener, input: SinkHandle) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(error = %err, "remote source accept failed");
                break;
            }
        };
        tracing::debug!(%peer, "producer connected");

        let input = Arc::clone(&input);
        tokio::spawn(async move {
            if let Err(err) = consume_stream(stream, &input).await {
                tracing::warn!(%peer, error = %err, "producer stream failed");
            }
        });
    }
}

async fn consume_stream(mut stream: TcpStream, input: &SinkHandle) -> Result<(), GraphwireError> {
    read_preamble(&mut stream).await?;

    while let Some(ev) = read_frame::<_, StampedEvent>(&mut stream).await? {
        // Short, uncontended critical section: the pipe input only
        // enqueues, it never blocks on the consumer.
        let mut sink = input
            .lock()
            .map_err(|_| GraphwireError::Dispatch("pipe input mutex poisoned".to_string()))?;
        // A refused event (bounded pipe full) loses that event only; the
        // stream keeps delivering the rest.
        if let Err(err) = dispatch_event(&mut *sink, &ev) {
            tracing::warn!(origin = %ev.origin, error = %err, "event refused; dropping");
        }
    }
    Ok(())
}
