//! `inspect` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::Program;
use ingestion::{IngestStats, SheetIngestor, SheetOptions};

use crate::cli::InspectArgs;

/// Inspection result for JSON output
#[derive(Serialize)]
struct InspectReport<'a> {
    sheet: String,
    header_row: Option<usize>,
    stats: StatsReport,
    programs: &'a [Program],
}

#[derive(Serialize)]
struct StatsReport {
    data_rows: usize,
    skipped_rows: usize,
    malformed_rows: usize,
    programs: usize,
    results: usize,
}

impl From<&IngestStats> for StatsReport {
    fn from(stats: &IngestStats) -> Self {
        Self {
            data_rows: stats.data_rows,
            skipped_rows: stats.skipped_rows,
            malformed_rows: stats.malformed_rows,
            programs: stats.programs,
            results: stats.results,
        }
    }
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    info!(sheet = %args.sheet.display(), "Inspecting results sheet");

    let grid = ingestion::read_grid(&args.sheet)
        .with_context(|| format!("Failed to read {}", args.sheet.display()))?;

    let ingestor = SheetIngestor::new(SheetOptions {
        header_row: args.header_row,
        header_scan_limit: args.header_scan_limit,
        grade_placeholder: args.grade_placeholder.clone(),
    });
    let ingest = ingestor.ingest(&grid);

    if args.json {
        let report = InspectReport {
            sheet: args.sheet.display().to_string(),
            header_row: ingest.header_row,
            stats: StatsReport::from(&ingest.stats),
            programs: &ingest.programs,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(args, &ingest.programs, &ingest.stats, ingest.header_row);
    }

    Ok(())
}

fn print_report(
    args: &InspectArgs,
    programs: &[Program],
    stats: &IngestStats,
    header: Option<usize>,
) {
    println!("\n=== {} ===\n", args.sheet.display());
    match header {
        Some(row) => println!("Header rows: {} and {}", row, row + 1),
        None => println!("Header rows: not found"),
    }
    println!(
        "Rows: {} data, {} skipped, {} malformed",
        stats.data_rows, stats.skipped_rows, stats.malformed_rows
    );
    println!("\nPrograms ({}):", programs.len());
    for program in programs {
        println!("  - {} ({} results)", program.key, program.results.len());
        if args.results {
            for result in &program.results {
                println!(
                    "      {:>3}  {:<24} {:<16} {}",
                    result.position, result.name, result.team, result.grade
                );
            }
        }
    }
    println!();
}
