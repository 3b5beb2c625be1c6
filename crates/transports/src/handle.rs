//! TransportHandle - runs the outbound half of a transport on its own queue
//!
//! Notices are handed over with a non-blocking `try_send`; the worker task
//! delivers them one by one. A slow or failing transport only affects its
//! own queue.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{AnnouncementEvent, Transport};

use crate::metrics::TransportMetrics;

/// Handle to a running transport worker
pub struct TransportHandle {
    /// Transport name
    name: String,
    /// Channel to send notices to worker
    tx: mpsc::Sender<AnnouncementEvent>,
    /// Shared metrics
    metrics: Arc<TransportMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl TransportHandle {
    /// Create a new TransportHandle and spawn the worker task
    pub fn spawn<T: Transport + Send + 'static>(transport: T, queue_capacity: usize) -> Self {
        let name = transport.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(TransportMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            transport_worker(transport, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<TransportMetrics> {
        &self.metrics
    }

    /// Queue a notice for delivery (non-blocking)
    ///
    /// Returns true if queued, false if the queue is full (notice dropped)
    pub fn try_send(&self, event: AnnouncementEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.inc_dropped_count();
                observability::record_transport_dropped(&self.name);
                warn!(
                    transport = %self.name,
                    kind = event.kind().as_str(),
                    "Queue full, notice dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(transport = %self.name, "Transport worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the transport worker gracefully
    ///
    /// Already queued notices are still delivered before the transport closes.
    #[instrument(name = "transport_handle_shutdown", skip(self), fields(transport = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(transport = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(transport = %self.name, "TransportHandle shutdown complete");
    }
}

/// Worker task that consumes notices and delivers them
#[instrument(
    name = "transport_worker_loop",
    skip(transport, rx, metrics),
    fields(transport = %name)
)]
async fn transport_worker<T: Transport>(
    mut transport: T,
    mut rx: mpsc::Receiver<AnnouncementEvent>,
    metrics: Arc<TransportMetrics>,
    name: String,
) {
    debug!(transport = %name, "Transport worker started");

    while let Some(event) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        let result = transport.send(&event).await;
        observability::record_transport_latency_ms(
            &name,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        match result {
            Ok(()) => {
                metrics.inc_sent_count();
                observability::record_transport_notice(&name, true);
            }
            Err(e) => {
                metrics.inc_failure_count();
                observability::record_transport_notice(&name, false);
                error!(
                    transport = %name,
                    kind = event.kind().as_str(),
                    program = event.program_name(),
                    error = %e,
                    "Notice delivery failed"
                );
            }
        }
    }

    if let Err(e) = transport.close().await {
        error!(transport = %name, error = %e, "Close failed on shutdown");
    }

    debug!(transport = %name, "Transport worker stopped");
}
