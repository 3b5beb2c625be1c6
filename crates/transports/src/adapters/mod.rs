//! Transport adapters
//!
//! Each adapter provides the outbound [`contracts::Transport`] half and,
//! where the channel carries display notifications back, an inbound task that
//! republishes them onto the announcement bus.

mod announce_endpoint;
mod cross_context;
mod log;
mod remote_socket;
mod rpc_channel;
mod socket;

pub use announce_endpoint::AnnounceEndpointTransport;
pub use cross_context::{ContextFrame, ContextHub, CrossContextTransport};
pub use log::LogTransport;
pub use remote_socket::RemoteSocketTransport;
pub use rpc_channel::RpcChannelTransport;

pub(crate) use cross_context::{next_context_id, spawn_inbound as spawn_cross_context_inbound};
pub(crate) use remote_socket::spawn_inbound as spawn_remote_socket_inbound;
pub(crate) use rpc_channel::spawn_inbound as spawn_rpc_inbound;
pub(crate) use socket::{connect_ws, spawn_drain, SocketParams};

use contracts::AnnouncementEvent;
use event_bus::AnnouncementBus;
use tracing::debug;

/// Republish an event received from outside onto the local bus
pub(crate) fn publish_inbound(transport: &str, bus: &AnnouncementBus, event: &AnnouncementEvent) {
    observability::record_inbound_message(transport, event.kind().as_str());
    let report = bus.publish(event);
    debug!(
        transport = %transport,
        kind = event.kind().as_str(),
        program = event.program_name(),
        delivered = report.delivered,
        failed = report.failed,
        "Inbound display event published"
    );
}
