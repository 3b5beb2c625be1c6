//! # Event Bus
//!
//! In-process, synchronous publish/subscribe over the closed set of
//! announcement event kinds.
//!
//! - Handlers for a kind run in subscription order, inside `publish`
//! - A handler that returns an error or panics is logged and skipped; the
//!   remaining handlers still run and the publisher never sees the fault
//! - Handlers may subscribe, unsubscribe or publish from inside a handler;
//!   changes take effect from the next `publish`
//!
//! ```ignore
//! let bus = AnnouncementBus::new();
//! let token = bus.subscribe(EventKind::ProgramSelected, |event| {
//!     println!("now showing {}", event.program_name());
//!     Ok(())
//! });
//! bus.publish(&event);
//! bus.unsubscribe(token);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{AnnouncementEvent, ContractError, EventKind};
use tracing::{error, trace, warn};

/// Subscriber callback
pub type Handler = dyn Fn(&AnnouncementEvent) -> Result<(), ContractError> + Send + Sync;

/// Returned by `subscribe`, consumed by `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    kind: EventKind,
    id: u64,
}

impl SubscriptionToken {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Outcome of one `publish` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub kind: EventKind,
    /// Handlers that returned `Ok`
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

type Subscribers = HashMap<EventKind, Vec<(u64, Arc<Handler>)>>;

/// Synchronous announcement bus
pub struct AnnouncementBus {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl AnnouncementBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // Handlers never run under the lock, so a poisoned map is still consistent
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for one event kind
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionToken
    where
        F: Fn(&AnnouncementEvent) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Arc<Handler> = Arc::new(handler);
        self.lock().entry(kind).or_default().push((id, handler));
        trace!(kind = kind.as_str(), id, "handler subscribed");
        SubscriptionToken { kind, id }
    }

    /// Register one handler for every event kind
    pub fn subscribe_all<F>(&self, handler: F) -> Vec<SubscriptionToken>
    where
        F: Fn(&AnnouncementEvent) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        EventKind::ALL
            .iter()
            .map(|&kind| {
                let handler = Arc::clone(&handler);
                self.subscribe(kind, move |event| handler(event))
            })
            .collect()
    }

    /// Remove a handler; returns false if it was already removed
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.lock();
        let Some(handlers) = subscribers.get_mut(&token.kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != token.id);
        before != handlers.len()
    }

    /// Number of handlers currently subscribed to `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler of its kind, in subscription order
    pub fn publish(&self, event: &AnnouncementEvent) -> PublishReport {
        let kind = event.kind();
        let handlers: Vec<(u64, Arc<Handler>)> =
            self.lock().get(&kind).cloned().unwrap_or_default();

        observability::record_bus_publish(kind.as_str(), handlers.len());

        let mut report = PublishReport {
            kind,
            delivered: 0,
            failed: 0,
        };

        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    observability::record_handler_fault(kind.as_str());
                    warn!(
                        component = "event_bus",
                        kind = kind.as_str(),
                        handler = id,
                        error = %e,
                        "Handler failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    observability::record_handler_fault(kind.as_str());
                    error!(
                        component = "event_bus",
                        kind = kind.as_str(),
                        handler = id,
                        panic = %panic_message(panic.as_ref()),
                        "Handler panicked"
                    );
                }
            }
        }

        trace!(
            kind = kind.as_str(),
            delivered = report.delivered,
            failed = report.failed,
            "event published"
        );
        report
    }
}

impl Default for AnnouncementBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
