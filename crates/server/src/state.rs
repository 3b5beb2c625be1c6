//! Shared server state: the program source and the display broadcast

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use contracts::AnnouncementEvent;

const BROADCAST_CAPACITY: usize = 64;

/// One display event on its way to every connected client
#[derive(Debug, Clone)]
pub struct Broadcast {
    /// Client that relayed the event; it does not get its own message back
    pub origin: Option<u64>,
    pub event: AnnouncementEvent,
}

/// State shared by all handlers
pub struct AppState<S> {
    source: Arc<S>,
    tx: broadcast::Sender<Broadcast>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            tx: self.tx.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(source: S) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            source: Arc::new(source),
            tx,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Send an event to every connected client; returns the number of clients
    pub fn publish(&self, origin: Option<u64>, event: AnnouncementEvent) -> usize {
        let kind = event.kind().as_str();
        match self.tx.send(Broadcast { origin, event }) {
            Ok(receivers) => {
                debug!(kind, receivers, "Display event broadcast");
                receivers
            }
            Err(_) => {
                debug!(kind, "Display event broadcast with no clients connected");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
