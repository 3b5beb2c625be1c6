//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Announcer - competition results announcer
#[derive(Parser, Debug)]
#[command(
    name = "announcer",
    author,
    version,
    about = "Competition results announcer",
    long_about = "Loads competition programs from a spreadsheet or a results backend, lets an \n\
                  operator announce results one by one, and mirrors every announcement \n\
                  to remote displays over the configured transports."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ANNOUNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ANNOUNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "ANNOUNCER_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a results sheet and print the programs found
    Inspect(InspectArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Interactive announcer console
    Run(RunArgs),

    /// Viewer: print display events arriving over the transports
    Watch(WatchArgs),

    /// Serve the results backend (REST + display sockets)
    Serve(ServeArgs),
}

/// Config file and source overrides shared by the runtime commands
#[derive(Parser, Debug, Clone)]
pub struct SourceArgs {
    /// Path to configuration file (TOML or JSON); built-in sample data when omitted
    #[arg(short, long, env = "ANNOUNCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Results sheet tried before the configured sources
    #[arg(long, env = "ANNOUNCER_SHEET")]
    pub sheet: Option<PathBuf>,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Workbook (.xlsx/.xls/.ods) or JSON grid
    pub sheet: PathBuf,

    /// 0-based row of the group header row
    #[arg(long, default_value = "1")]
    pub header_row: usize,

    /// Rows scanned for a header when --header-row does not hold one
    #[arg(long, default_value = "10")]
    pub header_scan_limit: usize,

    /// Grade value meaning "not graded"
    #[arg(long, default_value = "-")]
    pub grade_placeholder: String,

    /// Print results of every program
    #[arg(long)]
    pub results: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "announcer.toml", env = "ANNOUNCER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "announcer.toml", env = "ANNOUNCER_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show transport parameters
    #[arg(long)]
    pub transports: bool,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also republish display events received from the transports
    #[arg(long)]
    pub listen: bool,

    /// Run without any transport (local display only)
    #[arg(long)]
    pub local_only: bool,
}

/// Arguments for the `watch` command
#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "announcer.toml", env = "ANNOUNCER_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Override listen address from configuration
    #[arg(long, env = "ANNOUNCER_BIND")]
    pub bind: Option<String>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_sheet() {
        let cli =
            Cli::parse_from(["announcer", "-v", "run", "--sheet", "results.xlsx", "--listen"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.source.sheet, Some(PathBuf::from("results.xlsx")));
                assert!(args.listen);
                assert!(!args.local_only);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_inspect_defaults() {
        let cli = Cli::parse_from(["announcer", "inspect", "sheet.json", "--json"]);
        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.header_row, 1);
                assert_eq!(args.grade_placeholder, "-");
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
