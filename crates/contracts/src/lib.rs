//! # Contracts
//!
//! Frozen interface contracts shared by every crate: the program data model,
//! announcement events and their wire encodings, configuration, and the
//! `ProgramSource` / `Transport` traits.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Consistency Model
//! - Every announcement is a full replacement of display state
//! - No ordering or deduplication across transports

mod config;
mod error;
mod event;
mod program;
mod program_key;
mod source;
mod transport;

pub use config::*;
pub use error::*;
pub use event::*;
pub use program::*;
pub use program_key::ProgramKey;
pub use source::{LocalProgramSource, ProgramSource};
pub use transport::{LocalTransport, Transport};
