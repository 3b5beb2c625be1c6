//! Layered error definitions
//!
//! Categorized by source: config / source / transport / bus

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Program Source Errors =====
    /// Source could not be reached or its data could not be parsed
    #[error("source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    // ===== Transport Errors =====
    /// Transport connect/send failure
    #[error("transport '{transport}' unavailable: {message}")]
    TransportUnavailable { transport: String, message: String },

    /// Message could not be encoded/decoded for the wire
    #[error("transport '{transport}' codec error: {message}")]
    Codec { transport: String, message: String },

    // ===== Bus Errors =====
    /// Subscriber handler reported a failure
    #[error("handler failed: {0}")]
    Handler(String),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source unavailable error
    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create transport unavailable error
    pub fn transport_unavailable(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create codec error
    pub fn codec(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Codec {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create handler error
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Whether falling back to the next program source makes sense
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::Io(_))
    }
}
