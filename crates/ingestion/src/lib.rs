//! # Ingestion
//!
//! Program data ingestion module.
//!
//! Responsibilities:
//! - Resolve loosely named spreadsheet headers to logical fields (`FieldResolver`)
//! - Rebuild `Program` / `ResultEntry` records from a two-row header grid
//!   with merged-cell fill-down (`SheetIngestor`)
//! - Read grids from JSON files or workbooks (feature `xlsx`)
//! - Serve programs through `ProgramSource` implementations and an ordered
//!   fallback chain
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{build_chain, ProgramSource};
//!
//! let chain = build_chain(&config.sources)?;
//! let programs = chain.list_programs().await?;
//! let full = chain.fetch_program(&programs[0].key).await?;
//! ```

mod error;
mod field_resolver;
mod grid;
mod sheet;
mod sources;

// Re-exports
pub use contracts::ProgramSource;
pub use error::{IngestionError, Result};
pub use field_resolver::{normalize, resolve, FieldCandidates, FieldResolver, HeaderText, MatchTier};
pub use grid::{cell, parse_json_grid, read_grid, CellValue, Grid, GridFormat};
pub use sheet::{IngestStats, SheetIngest, SheetIngestor, SheetOptions};
pub use sources::{
    build_chain, sample_programs, ConfiguredSource, FallbackSource, RestSource, SampleSource,
    SheetSource,
};
