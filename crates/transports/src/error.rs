//! Transport error types

use thiserror::Error;

/// Transport-specific errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Adapter could not be constructed or connected
    #[error("failed to connect transport '{name}': {message}")]
    Connect { name: String, message: String },

    /// Missing or invalid adapter parameter
    #[error("invalid parameter for transport '{name}': {message}")]
    InvalidParams { name: String, message: String },

    /// Error reported through the transport contract
    #[error("transport error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl TransportError {
    /// Create a connect error
    pub fn connect(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_params(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            name: name.into(),
            message: message.into(),
        }
    }
}
