//! # Coordinator
//!
//! Announcement coordinator: the only owner of selection state.
//!
//! ## Usage
//!
//! ```ignore
//! use coordinator::AnnouncementCoordinator;
//!
//! let mut coord = AnnouncementCoordinator::new(source, bus, registry);
//! coord.load_programs().await?;
//! coord.select("101 - Dance Solo (Senior)").await?;
//! coord.announce(0)?;
//! ```

mod coordinator;
mod error;
mod selection;

pub use coordinator::{
    AnnounceOutcome, AnnouncementCoordinator, Completion, CoordinatorStatus, SelectOutcome,
    SelectionStatus,
};
pub use error::CoordinatorError;
