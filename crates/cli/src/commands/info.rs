//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{AnnouncerConfig, SourceConfig};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sources: Vec<SourceInfo>,
    transports: Vec<TransportInfo>,
    server_bind: String,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    target: String,
}

#[derive(Serialize)]
struct TransportInfo {
    name: String,
    kind: String,
    enabled: bool,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = super::load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let info = build_config_info(&config, args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &AnnouncerConfig, args: &InfoArgs) -> ConfigInfo {
    let sources = config
        .sources
        .iter()
        .map(|source| SourceInfo {
            kind: source.kind_name().to_string(),
            target: match source {
                SourceConfig::Sheet(sheet) => sheet.path.display().to_string(),
                SourceConfig::Rest(rest) => rest.base_url.clone(),
                SourceConfig::Sample => "built-in".to_string(),
            },
        })
        .collect();

    let transports = config
        .transports
        .iter()
        .map(|t| TransportInfo {
            name: t.name.clone(),
            kind: format!("{:?}", t.kind),
            enabled: t.enabled,
            queue_capacity: t.queue_capacity,
            params: if args.transports {
                t.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        sources,
        transports,
        server_bind: config.server.bind.clone(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Announcer Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nSources (fallback order):");
    for (i, source) in info.sources.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, source.kind, source.target);
    }

    if info.transports.is_empty() {
        println!("\nTransports: none (local display only)");
    } else {
        println!("\nTransports ({}):", info.transports.len());
        for t in &info.transports {
            let state = if t.enabled { "" } else { " [disabled]" };
            println!(
                "  - {} ({}) queue {}{}",
                t.name, t.kind, t.queue_capacity, state
            );
            for (key, value) in &t.params {
                println!("      {} = {}", key, value);
            }
        }
    }

    println!("\nServer: {}", info.server_bind);
    println!();
}
