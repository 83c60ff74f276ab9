//! # graphwire-core
//!
//! The event-sourced graph replication core - THE LOGIC.
//!
//! This crate implements the attributed-graph store and the replication
//! machinery around it: every mutation becomes exactly one stamped event,
//! every consumer is a sink, and graphs mirror each other by consuming one
//! another's event streams.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is the ONLY place where graph state lives (stateful)
//! - Is synchronous: no async, no network dependencies (pure Rust)
//! - Dedupes by per-source sequence stamps, never by content
//! - Never blocks a mutation on a slow consumer; the boundary pipe
//!   decouples producer and consumer threads

// =============================================================================
// MODULES
// =============================================================================

pub mod attributes;
pub mod config;
pub mod event;
pub mod graph;
pub mod pipe;
pub mod sink;
pub mod source;
pub mod sync;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AttrValue, ElementKind, ElementRef, GraphwireError, SourceId};

// =============================================================================
// RE-EXPORTS: Events and Contracts
// =============================================================================

pub use event::{Event, StampedEvent};
pub use sink::{Sink, SinkHandle, dispatch_event, sink_handle};
pub use source::{ErrorHook, SinkSet, Source};

// =============================================================================
// RE-EXPORTS: Graph Store and Replication
// =============================================================================

pub use attributes::AttributeSet;
pub use config::{
    PipeCapacity, RENDERER_ALIAS, RENDERER_KEY, ReplicationConfig, SYNC_DISABLE_ALIAS,
    SYNC_DISABLE_KEY,
};
pub use graph::{Edge, Graph, Node};
pub use pipe::{BoundaryPipe, PipeInput};
pub use sync::TimeGuard;
