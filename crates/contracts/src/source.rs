//! ProgramSource trait - where programs and their results come from
//!
//! Implemented by the spreadsheet reader, the REST collaborator, the built-in
//! sample data and the fallback chain combining them.

use crate::{ContractError, Program};

/// Program data source
#[trait_variant::make(ProgramSource: Send)]
pub trait LocalProgramSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// All programs, without results
    ///
    /// # Errors
    /// `SourceUnavailable` when the source cannot be reached or parsed.
    async fn list_programs(&self) -> Result<Vec<Program>, ContractError>;

    /// One program with its results, `None` if the key is unknown
    ///
    /// # Errors
    /// `SourceUnavailable` when the source cannot be reached or parsed.
    async fn fetch_program(&self, key: &str) -> Result<Option<Program>, ContractError>;
}
