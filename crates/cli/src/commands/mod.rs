//! Command implementations.

mod info;
mod inspect;
mod run;
mod serve;
mod validate;
mod watch;

pub use info::run_info;
pub use inspect::run_inspect;
pub use run::run_console;
pub use serve::run_serve;
pub use validate::run_validate;
pub use watch::run_watch;

use std::path::Path;

use contracts::{AnnouncerConfig, SheetSourceConfig, SourceConfig};
use event_bus::AnnouncementBus;
use tracing::{info, warn};

use crate::cli::SourceArgs;
use crate::console::render_event;
use crate::error::{CliError, Result};

/// Load and validate a configuration file
pub(crate) fn load_config(path: &Path) -> Result<AnnouncerConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

/// Configuration for the runtime commands
///
/// Without `--config` the built-in sample data is used; `--sheet` is tried
/// before every configured source.
pub(crate) fn load_runtime_config(args: &SourceArgs) -> Result<AnnouncerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            load_config(path)?
        }
        None => {
            info!("No configuration given, using built-in sample programs");
            AnnouncerConfig::sample_only()
        }
    };

    if let Some(sheet) = &args.sheet {
        info!(sheet = %sheet.display(), "Sheet source added from command line");
        config
            .sources
            .insert(0, SourceConfig::Sheet(SheetSourceConfig::new(sheet)));
    }
    Ok(config)
}

/// Print every display event on stdout
pub(crate) fn attach_display(bus: &AnnouncementBus) {
    bus.subscribe_all(|event| {
        println!("{}", render_event(event));
        Ok(())
    });
}

/// Resolves on Ctrl+C or SIGTERM
pub(crate) async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(component = "cli", error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(component = "cli", error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
