//! RemoteSocketTransport - one persistent JSON socket to a display endpoint
//!
//! Outbound notices and inbound messages share the
//! `{"type": "DISPLAY_PROGRAM" | "DISPLAY_RESULT", "payload": {...}}` shape.
//! The connection lives as long as the adapter; a dropped connection is not
//! re-established.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{instrument, warn};

use contracts::{AnnouncementEvent, ContractError, Transport};
use event_bus::AnnouncementBus;

use super::publish_inbound;
use super::socket::{close_writer, send_text, spawn_reader, WsReader, WsWriter};

/// Outbound half of the remote socket adapter
pub struct RemoteSocketTransport {
    name: String,
    writer: Option<WsWriter>,
}

impl RemoteSocketTransport {
    pub(crate) fn new(name: impl Into<String>, writer: WsWriter) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
        }
    }
}

impl Transport for RemoteSocketTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "remote_socket_send",
        skip(self, event),
        fields(transport = %self.name, kind = event.kind().as_str())
    )]
    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError> {
        let json = serde_json::to_string(event)
            .map_err(|e| ContractError::codec(&self.name, e.to_string()))?;
        send_text(&mut self.writer, &self.name, json).await
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        close_writer(&mut self.writer, &self.name).await;
        Ok(())
    }
}

/// Parse one inbound message and publish it
///
/// Returns false when the message is not a display event.
pub(crate) fn handle_inbound(name: &str, bus: &AnnouncementBus, text: &str) -> bool {
    match serde_json::from_str::<AnnouncementEvent>(text) {
        Ok(event) => {
            publish_inbound(name, bus, &event);
            true
        }
        Err(e) => {
            observability::record_inbound_rejected(name);
            warn!(
                component = "transports",
                transport = %name,
                error = %e,
                "Unrecognised socket message ignored"
            );
            false
        }
    }
}

/// Spawn the inbound half: every display message goes onto the bus
pub(crate) fn spawn_inbound(
    name: String,
    reader: WsReader,
    bus: Arc<AnnouncementBus>,
) -> JoinHandle<()> {
    let handler_name = name.clone();
    spawn_reader(name, reader, move |text| {
        handle_inbound(&handler_name, &bus, text);
    })
}
