//! `serve` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use super::{load_runtime_config, setup_shutdown_signal};
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut config = load_runtime_config(&args.source)?;
    if let Some(bind) = &args.bind {
        info!(bind = %bind, "Overriding listen address from CLI");
        config.server.bind = bind.clone();
    }

    let source =
        ingestion::build_chain(&config.sources).context("Failed to build program sources")?;

    server::serve(source, &config.server.bind, async {
        setup_shutdown_signal().await;
        info!("Shutdown signal received, stopping server...");
    })
    .await
    .context("Results server failed")?;

    Ok(())
}
