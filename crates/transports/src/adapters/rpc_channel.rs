//! RpcChannelTransport - bidirectional request/notification channel
//!
//! Outbound: `show_program` / `show_result` requests, fire-and-forget.
//! Inbound: `display_program` / `display_result` pushes from the server.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use contracts::{AnnouncementEvent, ContractError, RpcFrame, Transport};
use event_bus::AnnouncementBus;

use super::publish_inbound;
use super::socket::{close_writer, send_text, spawn_reader, WsReader, WsWriter};

/// Outbound half of the RPC channel adapter
pub struct RpcChannelTransport {
    name: String,
    writer: Option<WsWriter>,
}

impl RpcChannelTransport {
    pub(crate) fn new(name: impl Into<String>, writer: WsWriter) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
        }
    }
}

impl Transport for RpcChannelTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "rpc_channel_send",
        skip(self, event),
        fields(transport = %self.name, kind = event.kind().as_str())
    )]
    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError> {
        // Requests are addressed by program key
        let Some(frame) = RpcFrame::request_for(event) else {
            debug!(
                transport = %self.name,
                program = event.program_name(),
                "Event has no program key, request skipped"
            );
            return Ok(());
        };

        let json = serde_json::to_string(&frame)
            .map_err(|e| ContractError::codec(&self.name, e.to_string()))?;
        send_text(&mut self.writer, &self.name, json).await
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        close_writer(&mut self.writer, &self.name).await;
        Ok(())
    }
}

/// Handle one inbound frame; returns true when an event was published
pub(crate) fn handle_inbound(name: &str, bus: &AnnouncementBus, text: &str) -> bool {
    let frame = match serde_json::from_str::<RpcFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            observability::record_inbound_rejected(name);
            warn!(
                component = "transports",
                transport = %name,
                error = %e,
                "Unrecognised RPC frame ignored"
            );
            return false;
        }
    };

    let event_name = frame.name();
    match frame.into_event() {
        Some(event) => {
            publish_inbound(name, bus, &event);
            true
        }
        None => {
            debug!(transport = %name, event = event_name, "Request frame ignored on client side");
            false
        }
    }
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{connect_ws, SocketParams};
    use contracts::{DisplayResult, EventKind, ResultEntry};
    use futures_util::StreamExt;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    #[test]
    fn test_display_result_push_published() {
        let bus = AnnouncementBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.subscribe(EventKind::ResultSelected, move |event| {
            if let AnnouncementEvent::ResultSelected(r) = event {
                assert_eq!(r.result.name, "Asha");
            }
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let text = json!({
            "event": "display_result",
            "data": {
                "program_key": "prog-1",
                "program_name": "Quiz",
                "section": "Open",
                "result": { "position": "1", "name": "Asha", "team": "Red" }
            }
        })
        .to_string();

        assert!(handle_inbound("rpc", &bus, &text));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_request_frames_and_garbage_ignored() {
        let bus = AnnouncementBus::new();
        let show = json!({ "event": "show_program", "data": { "program_key": "k" } }).to_string();
        assert!(!handle_inbound("rpc", &bus, &show));
        assert!(!handle_inbound("rpc", &bus, r#"{"event":"reboot","data":{}}"#));
        assert!(!handle_inbound("rpc", &bus, "{"));
    }

    #[tokio::test]
    async fn test_outbound_show_result_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel::<String>(4);
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    tx.send(text.as_str().to_string()).await.unwrap();
                }
            }
        });

        let params = SocketParams::from_params(
            "rpc",
            &HashMap::from([("url".to_string(), format!("ws://{addr}/rpc"))]),
        )
        .unwrap();
        let (writer, _reader) = connect_ws("rpc", &params).await.unwrap();
        let mut transport = RpcChannelTransport::new("rpc", writer);

        // No key: nothing goes on the wire
        let keyless = AnnouncementEvent::ResultSelected(DisplayResult {
            program_key: None,
            program_name: "Quiz".into(),
            section: "Open".into(),
            result_index: Some(0),
            result: ResultEntry::default(),
        });
        transport.send(&keyless).await.unwrap();

        let keyed = AnnouncementEvent::ResultSelected(DisplayResult {
            program_key: Some("prog-1".into()),
            program_name: "Quiz".into(),
            section: "Open".into(),
            result_index: Some(1),
            result: ResultEntry::default(),
        });
        transport.send(&keyed).await.unwrap();

        let raw = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["event"], "show_result");
        assert_eq!(value["data"]["program_key"], "prog-1");
        assert_eq!(value["data"]["result_index"], 1);

        transport.close().await.unwrap();
    }
}
