//! # Transports
//!
//! Transport adapters mirroring announcements to other displays.
//!
//! Responsibilities:
//! - Build every enabled adapter from `TransportConfig` (remote socket, RPC
//!   channel, cross-context, announce endpoint, log)
//! - Run each adapter's outbound half on its own bounded queue
//! - Republish inbound display events onto the announcement bus
//! - Track per-transport metrics
//!
//! A transport that fails to connect or send is logged and never stops the
//! others; with no transport at all the system runs on the local bus alone.

mod adapters;
mod error;
mod handle;
mod metrics;
mod registry;

pub use adapters::{
    AnnounceEndpointTransport, ContextFrame, ContextHub, CrossContextTransport, LogTransport,
    RemoteSocketTransport, RpcChannelTransport,
};
pub use error::TransportError;
pub use handle::TransportHandle;
pub use metrics::{MetricsSnapshot, TransportMetrics};
pub use registry::{Direction, TransportRegistry, TransportRegistryBuilder};
