//! Coordinator error types

use contracts::{ContractError, ProgramKey};
use thiserror::Error;

/// Rejected operator actions and source failures
///
/// Every variant leaves the coordinator state untouched.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// No program with this key in the source
    #[error("program '{0}' not found")]
    ProgramNotFound(String),

    /// Program has already been announced in full
    #[error("program '{0}' has already been read")]
    AlreadyRead(ProgramKey),

    /// `announce` without an active selection
    #[error("no program selected")]
    NoSelection,

    /// Result index outside the selected program
    #[error("result index {index} out of range (program has {count} results)")]
    ResultOutOfRange { index: usize, count: usize },

    /// Program source failed (all sources, for a fallback chain)
    #[error(transparent)]
    Source(#[from] ContractError),
}

impl CoordinatorError {
    /// Operator mistakes, as opposed to source failures
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Source(_))
    }
}
