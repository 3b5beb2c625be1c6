//! CrossContextTransport - fan-out between sibling contexts of one process
//!
//! Contexts that share a [`ContextHub`] exchange [`ContextFrame`]s over a named
//! broadcast channel. Sending never fails observably; a context with no peers
//! simply has nobody listening.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use contracts::{AnnouncementEvent, ContractError, Transport};
use event_bus::AnnouncementBus;

use super::publish_inbound;

/// Per-channel buffer; slower receivers see `Lagged` and skip ahead
const CHANNEL_CAPACITY: usize = 64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Frame on a cross-context channel: the event plus the sending context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFrame {
    pub origin: u64,
    #[serde(flatten)]
    pub event: AnnouncementEvent,
}

/// Named broadcast channels shared by every context of the process
#[derive(Debug, Clone, Default)]
pub struct ContextHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ContextFrame>>>>,
}

impl ContextHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender for `channel`, created on first use
    pub fn channel(&self, channel: &str) -> broadcast::Sender<ContextFrame> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Number of live receivers on `channel`
    pub fn receiver_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.get(channel).map_or(0, |tx| tx.receiver_count())
    }
}

/// Allocate a process-unique context id
pub(crate) fn next_context_id() -> u64 {
    NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Outbound half of the cross-context adapter
pub struct CrossContextTransport {
    name: String,
    channel: String,
    origin: u64,
    tx: broadcast::Sender<ContextFrame>,
}

impl CrossContextTransport {
    pub fn new(name: impl Into<String>, hub: &ContextHub, channel: &str, origin: u64) -> Self {
        Self {
            name: name.into(),
            channel: channel.to_string(),
            origin,
            tx: hub.channel(channel),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }
}

impl Transport for CrossContextTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError> {
        let frame = ContextFrame {
            origin: self.origin,
            event: event.clone(),
        };
        // Err only means no context is listening right now
        if self.tx.send(frame).is_err() {
            debug!(transport = %self.name, channel = %self.channel, "No sibling context listening");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Spawn the inbound half: frames from other contexts go onto the bus
///
/// Frames carrying `origin` (this context's own) are skipped.
pub(crate) fn spawn_inbound(
    name: String,
    mut rx: broadcast::Receiver<ContextFrame>,
    origin: u64,
    bus: Arc<AnnouncementBus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) if frame.origin == origin => {}
                Ok(frame) => publish_inbound(&name, &bus, &frame.event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        component = "transports",
                        transport = %name,
                        skipped,
                        "Cross-context receiver lagged, frames skipped"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!(transport = %name, "Cross-context channel closed");
    })
}
