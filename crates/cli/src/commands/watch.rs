//! `watch` command implementation.

use std::sync::Arc;

use anyhow::Result;
use event_bus::AnnouncementBus;
use tracing::{info, warn};

use transports::{Direction, TransportRegistryBuilder};

use super::{attach_display, load_config, setup_shutdown_signal};
use crate::cli::WatchArgs;

/// Execute the `watch` command
pub async fn run_watch(args: &WatchArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    let bus = Arc::new(AnnouncementBus::new());
    attach_display(&bus);

    let mut registry = TransportRegistryBuilder::new(Arc::clone(&bus))
        .direction(Direction::Inbound)
        .build(&config.transports)
        .await;

    let inbound = registry.inbound_names().join(", ");
    if inbound.is_empty() {
        anyhow::bail!("No inbound transport could be connected, nothing to watch");
    }
    info!(transports = %inbound, "Watching for display events");

    tokio::select! {
        _ = registry.wait_inbound() => {
            warn!("All inbound streams closed");
        }
        _ = setup_shutdown_signal() => {
            warn!("Received shutdown signal, stopping viewer...");
        }
    }

    registry.shutdown().await;
    Ok(())
}
