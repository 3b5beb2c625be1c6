//! Program sources
//!
//! Each source implements [`contracts::ProgramSource`]. `FallbackSource`
//! chains them in configuration order.

mod configured;
mod fallback;
mod rest;
mod sample;
mod sheet;

pub use configured::{build_chain, ConfiguredSource};
pub use fallback::FallbackSource;
pub use rest::RestSource;
pub use sample::{sample_programs, SampleSource};
pub use sheet::SheetSource;
