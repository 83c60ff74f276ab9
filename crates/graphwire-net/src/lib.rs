//! # graphwire-net
//!
//! Remote event transport for graphwire - THE WIRE.
//!
//! Everything stateful stays in `graphwire-core`; this crate only moves
//! stamped events between processes. It provides the frame format, a name
//! registry for endpoint discovery, and the remote sink/source pair that
//! make a TCP connection look like an ordinary source-to-sink link.

// =============================================================================
// MODULES
// =============================================================================

pub mod registry;
pub mod remote;
pub mod wire;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use registry::{Registry, bind_name, lookup_name, parse_locator};
pub use remote::{RemoteSink, RemoteSource};
pub use wire::{
    MAGIC_BYTES, MAX_FRAME_SIZE, RegistryRequest, RegistryResponse, WIRE_VERSION, read_frame,
    write_frame,
};
