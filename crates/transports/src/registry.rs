//! TransportRegistry - every active adapter, built once from configuration
//!
//! The coordinator owns the registry and calls [`TransportRegistry::notify`]
//! after each local publish. Adapters that fail to connect are logged and
//! left out; an empty registry is the local-bus-only mode.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{AnnouncementEvent, TransportConfig, TransportKind, DEFAULT_CROSS_CONTEXT_CHANNEL};
use event_bus::AnnouncementBus;

use crate::adapters::{
    connect_ws, next_context_id, spawn_cross_context_inbound, spawn_remote_socket_inbound,
    spawn_drain, spawn_rpc_inbound, AnnounceEndpointTransport, ContextHub, CrossContextTransport,
    LogTransport, RemoteSocketTransport, RpcChannelTransport, SocketParams,
};
use crate::error::TransportError;
use crate::handle::TransportHandle;
use crate::metrics::MetricsSnapshot;

/// Which halves of the adapters to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Announcer side: send notices only
    #[default]
    Outbound,
    /// Viewer side: republish inbound display events only
    Inbound,
    Both,
}

impl Direction {
    pub fn outbound(self) -> bool {
        matches!(self, Direction::Outbound | Direction::Both)
    }

    pub fn inbound(self) -> bool {
        matches!(self, Direction::Inbound | Direction::Both)
    }
}

/// Result of connecting one adapter
#[derive(Default)]
struct Connected {
    handle: Option<TransportHandle>,
    reader: Option<JoinHandle<()>>,
    /// Discards frames of a socket whose read half is not republished
    drain: Option<JoinHandle<()>>,
}

impl Connected {
    fn is_empty(&self) -> bool {
        self.handle.is_none() && self.reader.is_none()
    }
}

/// Builder for creating a TransportRegistry
pub struct TransportRegistryBuilder {
    bus: Arc<AnnouncementBus>,
    hub: ContextHub,
    direction: Direction,
}

impl TransportRegistryBuilder {
    pub fn new(bus: Arc<AnnouncementBus>) -> Self {
        Self {
            bus,
            hub: ContextHub::new(),
            direction: Direction::default(),
        }
    }

    /// Share cross-context channels with other registries of this process
    pub fn hub(mut self, hub: ContextHub) -> Self {
        self.hub = hub;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Connect every enabled transport
    ///
    /// Never fails: a transport that cannot be set up is logged and skipped.
    #[instrument(
        name = "transport_registry_build",
        skip(self, configs),
        fields(transport_count = configs.len(), direction = ?self.direction)
    )]
    pub async fn build(self, configs: &[TransportConfig]) -> TransportRegistry {
        let mut registry = TransportRegistry::empty();

        for config in configs.iter().filter(|c| c.enabled) {
            match self.connect(config).await {
                Ok(connected) if connected.is_empty() => {
                    debug!(
                        transport = %config.name,
                        direction = ?self.direction,
                        "Transport has nothing to run in this direction"
                    );
                }
                Ok(connected) => {
                    if let Some(handle) = connected.handle {
                        registry.handles.push(handle);
                    }
                    if let Some(reader) = connected.reader {
                        registry.readers.push((config.name.clone(), reader));
                    }
                    if let Some(drain) = connected.drain {
                        registry.drains.push(drain);
                    }
                    info!(transport = %config.name, kind = ?config.kind, "Transport active");
                }
                Err(e) => {
                    warn!(
                        component = "transports",
                        transport = %config.name,
                        kind = ?config.kind,
                        error = %e,
                        "Transport unavailable, continuing without it"
                    );
                    registry.failures.push((config.name.clone(), e.to_string()));
                }
            }
        }

        info!(
            outbound = registry.handles.len(),
            inbound = registry.readers.len(),
            failed = registry.failures.len(),
            "Transport registry ready"
        );
        registry
    }

    /// Create the halves of one transport from configuration
    #[instrument(
        name = "transport_registry_connect",
        skip(self, config),
        fields(transport = %config.name, kind = ?config.kind)
    )]
    async fn connect(&self, config: &TransportConfig) -> Result<Connected, TransportError> {
        let name = config.name.as_str();
        let outbound = self.direction.outbound();
        let inbound = self.direction.inbound();

        match config.kind {
            TransportKind::RemoteSocket => {
                let params = SocketParams::from_params(name, &config.params)?;
                let (writer, reader) = connect_ws(name, &params).await?;
                let mut connected = Connected {
                    handle: outbound.then(|| {
                        TransportHandle::spawn(
                            RemoteSocketTransport::new(name, writer),
                            config.queue_capacity,
                        )
                    }),
                    ..Connected::default()
                };
                if inbound {
                    connected.reader = Some(spawn_remote_socket_inbound(
                        name.to_string(),
                        reader,
                        Arc::clone(&self.bus),
                    ));
                } else {
                    connected.drain = Some(spawn_drain(name.to_string(), reader));
                }
                Ok(connected)
            }
            TransportKind::RpcChannel => {
                let params = SocketParams::from_params(name, &config.params)?;
                let (writer, reader) = connect_ws(name, &params).await?;
                let mut connected = Connected {
                    handle: outbound.then(|| {
                        TransportHandle::spawn(
                            RpcChannelTransport::new(name, writer),
                            config.queue_capacity,
                        )
                    }),
                    ..Connected::default()
                };
                if inbound {
                    connected.reader =
                        Some(spawn_rpc_inbound(name.to_string(), reader, Arc::clone(&self.bus)));
                } else {
                    connected.drain = Some(spawn_drain(name.to_string(), reader));
                }
                Ok(connected)
            }
            TransportKind::CrossContext => {
                let channel = config
                    .params
                    .get("channel")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CROSS_CONTEXT_CHANNEL);
                if channel.trim().is_empty() {
                    return Err(TransportError::invalid_params(name, "channel cannot be blank"));
                }
                let origin = next_context_id();
                let reader = inbound.then(|| {
                    spawn_cross_context_inbound(
                        name.to_string(),
                        self.hub.channel(channel).subscribe(),
                        origin,
                        Arc::clone(&self.bus),
                    )
                });
                Ok(Connected {
                    handle: outbound.then(|| {
                        TransportHandle::spawn(
                            CrossContextTransport::new(name, &self.hub, channel, origin),
                            config.queue_capacity,
                        )
                    }),
                    reader,
                    drain: None,
                })
            }
            TransportKind::AnnounceEndpoint => {
                let transport = AnnounceEndpointTransport::from_params(name, &config.params)?;
                Ok(Connected {
                    handle: outbound
                        .then(|| TransportHandle::spawn(transport, config.queue_capacity)),
                    ..Connected::default()
                })
            }
            TransportKind::Log => Ok(Connected {
                handle: outbound.then(|| {
                    TransportHandle::spawn(LogTransport::new(name), config.queue_capacity)
                }),
                ..Connected::default()
            }),
        }
    }
}

/// Active transports of one announcer or viewer
#[derive(Default)]
pub struct TransportRegistry {
    handles: Vec<TransportHandle>,
    readers: Vec<(String, JoinHandle<()>)>,
    drains: Vec<JoinHandle<()>>,
    failures: Vec<(String, String)>,
}

impl TransportRegistry {
    /// Local-bus-only registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry with custom handles (for testing)
    pub fn with_handles(handles: Vec<TransportHandle>) -> Self {
        Self {
            handles,
            ..Self::default()
        }
    }

    /// Hand an event to every outbound transport without waiting
    ///
    /// Returns how many transports accepted it into their queue.
    pub fn notify(&self, event: &AnnouncementEvent) -> usize {
        let queued = self
            .handles
            .iter()
            .filter(|handle| handle.try_send(event.clone()))
            .count();
        debug!(
            kind = event.kind().as_str(),
            queued,
            transports = self.handles.len(),
            "Notice fanned out"
        );
        queued
    }

    /// Metrics for all outbound transports
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Names of outbound transports
    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(TransportHandle::name).collect()
    }

    /// Names of transports republishing inbound events
    pub fn inbound_names(&self) -> Vec<&str> {
        self.readers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Transports that could not be set up, with the reason
    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty() && self.readers.is_empty()
    }

    /// Wait until every inbound stream has ended
    pub async fn wait_inbound(&mut self) {
        for (name, reader) in self.readers.drain(..) {
            if let Err(e) = reader.await {
                if !e.is_cancelled() {
                    warn!(
                        component = "transports",
                        transport = %name,
                        error = ?e,
                        "Inbound task failed"
                    );
                }
            }
        }
    }

    /// Drain outbound queues, close connections and stop inbound tasks
    #[instrument(name = "transport_registry_shutdown", skip(self))]
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.shutdown().await;
        }
        for (name, reader) in self.readers {
            reader.abort();
            debug!(transport = %name, "Inbound task stopped");
        }
        for drain in self.drains {
            drain.abort();
        }
        info!("Transport registry shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DisplayProgram, EventKind};
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout, Duration};
    use tokio_tungstenite::tungstenite::Message;

    fn selected() -> AnnouncementEvent {
        AnnouncementEvent::ProgramSelected(DisplayProgram {
            program_key: Some("prog-1".into()),
            program_name: "Quiz".into(),
            section: "Open".into(),
        })
    }

    #[tokio::test]
    async fn test_unreachable_socket_is_skipped() {
        // Freed port: nothing listens there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let configs = vec![
            TransportConfig::new("viewer_ws", TransportKind::RemoteSocket)
                .with_param("url", format!("ws://127.0.0.1:{port}/ws"))
                .with_param("connect_timeout_ms", "500"),
            TransportConfig::new("log", TransportKind::Log),
        ];

        let registry = TransportRegistryBuilder::new(Arc::new(AnnouncementBus::new()))
            .build(&configs)
            .await;

        assert_eq!(registry.names(), vec!["log"]);
        assert_eq!(registry.failures().len(), 1);
        assert_eq!(registry.failures()[0].0, "viewer_ws");
        assert_eq!(registry.notify(&selected()), 1);
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_and_empty() {
        let mut log = TransportConfig::new("log", TransportKind::Log);
        log.enabled = false;
        let registry = TransportRegistryBuilder::new(Arc::new(AnnouncementBus::new()))
            .build(&[log])
            .await;
        assert!(registry.is_empty());
        assert_eq!(registry.notify(&selected()), 0);
    }

    #[tokio::test]
    async fn test_inbound_direction_skips_outbound_only_kinds() {
        let configs = vec![TransportConfig::new("log", TransportKind::Log)];
        let registry = TransportRegistryBuilder::new(Arc::new(AnnouncementBus::new()))
            .direction(Direction::Inbound)
            .build(&configs)
            .await;
        assert!(registry.is_empty());
        assert!(registry.failures().is_empty());
    }

    #[tokio::test]
    async fn test_cross_context_between_registries() {
        let hub = ContextHub::new();
        let configs = vec![TransportConfig::new("tabs", TransportKind::CrossContext)];

        let announcer_bus = Arc::new(AnnouncementBus::new());
        let announcer = TransportRegistryBuilder::new(Arc::clone(&announcer_bus))
            .hub(hub.clone())
            .direction(Direction::Both)
            .build(&configs)
            .await;

        let viewer_bus = Arc::new(AnnouncementBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        viewer_bus.subscribe(EventKind::ProgramSelected, move |event| {
            let _ = tx.send(event.clone());
            Ok(())
        });
        let viewer = TransportRegistryBuilder::new(Arc::clone(&viewer_bus))
            .hub(hub.clone())
            .direction(Direction::Inbound)
            .build(&configs)
            .await;
        assert_eq!(viewer.inbound_names(), vec!["tabs"]);

        assert_eq!(announcer.notify(&selected()), 1);
        let got = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(got, Some(selected()));

        announcer.shutdown().await;
        viewer.shutdown().await;
    }

    #[tokio::test]
    async fn test_metrics_per_transport() {
        let registry = TransportRegistry::with_handles(vec![
            TransportHandle::spawn(LogTransport::new("a"), 8),
            TransportHandle::spawn(LogTransport::new("b"), 8),
        ]);
        registry.notify(&selected());
        let metrics = registry.metrics();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].0, "a");
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_outbound_socket_discards_server_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, mut received_rx) = mpsc::channel::<String>(1);

        // Broadcasting display server: floods the announcer with frames it never asked for
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let push = serde_json::to_string(&selected()).unwrap();
            for _ in 0..256 {
                ws.send(Message::text(push.clone())).await.unwrap();
            }
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                received_tx.send(text.as_str().to_string()).await.unwrap();
            }
            ws.close(None).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let configs = vec![TransportConfig::new("viewer_ws", TransportKind::RemoteSocket)
            .with_param("url", format!("ws://{addr}/ws"))];
        let bus = Arc::new(AnnouncementBus::new());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        bus.subscribe(EventKind::ProgramSelected, move |event| {
            let _ = seen_tx.send(event.clone());
            Ok(())
        });
        let registry = TransportRegistryBuilder::new(Arc::clone(&bus))
            .build(&configs)
            .await;

        assert_eq!(registry.names(), vec!["viewer_ws"]);
        assert!(registry.inbound_names().is_empty());
        assert_eq!(registry.drains.len(), 1);

        assert_eq!(registry.notify(&selected()), 1);
        let raw = timeout(Duration::from_secs(2), received_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("DISPLAY_PROGRAM"));

        // Server close ends the drain
        timeout(Duration::from_secs(2), async {
            while !registry.drains.iter().all(JoinHandle::is_finished) {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        // Discarded frames never reach the local bus
        assert!(seen_rx.try_recv().is_err());
        registry.shutdown().await;
    }
}
