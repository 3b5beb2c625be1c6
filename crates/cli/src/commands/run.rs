//! `run` command implementation.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use event_bus::AnnouncementBus;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use coordinator::AnnouncementCoordinator;
use transports::{Direction, TransportRegistry, TransportRegistryBuilder};

use super::{attach_display, load_runtime_config, setup_shutdown_signal};
use crate::cli::RunArgs;
use crate::console::{Console, Flow};

/// Execute the `run` command
pub async fn run_console(args: &RunArgs) -> Result<()> {
    let config = load_runtime_config(&args.source)?;
    let source =
        ingestion::build_chain(&config.sources).context("Failed to build program sources")?;

    let bus = Arc::new(AnnouncementBus::new());
    attach_display(&bus);

    let registry = if args.local_only {
        info!("Local-only mode, transports disabled");
        TransportRegistry::empty()
    } else {
        let direction = if args.listen {
            Direction::Both
        } else {
            Direction::Outbound
        };
        TransportRegistryBuilder::new(Arc::clone(&bus))
            .direction(direction)
            .build(&config.transports)
            .await
    };
    for (name, reason) in registry.failures() {
        warn!(
            component = "cli",
            transport = %name,
            reason = %reason,
            "Continuing without transport"
        );
    }

    let mut console = Console::new(AnnouncementCoordinator::new(source, bus, registry));
    let mut stdout = std::io::stdout();
    console.load(&mut stdout).await?;
    writeln!(stdout, "Type 'help' for commands")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = setup_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read console input")? else {
                    info!("Console input closed");
                    break;
                };
                if console.handle_line(&line, &mut stdout).await? == Flow::Quit {
                    break;
                }
                stdout.flush()?;
            }
            _ = &mut shutdown => {
                warn!("Received shutdown signal, leaving console...");
                break;
            }
        }
    }

    console.finish(&mut stdout).await?;
    info!("Announcer finished");
    Ok(())
}
