//! Transport trait - outbound half of a transport adapter
//!
//! Each adapter bridges one external channel. The outbound half implements
//! this trait and is driven by its own worker task; the inbound half (if any)
//! publishes straight onto the announcement bus.

use crate::{AnnouncementEvent, ContractError};

/// Outbound notification channel
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one announcement
    ///
    /// # Errors
    /// Returns `TransportUnavailable` / `Codec`; callers log and continue.
    async fn send(&mut self, event: &AnnouncementEvent) -> Result<(), ContractError>;

    /// Release the underlying connection
    async fn close(&mut self) -> Result<(), ContractError>;
}
