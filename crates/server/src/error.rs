//! Server error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Listen address could not be parsed
    #[error("invalid bind address '{addr}': {message}")]
    InvalidAddr { addr: String, message: String },

    /// Listener could not be opened
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
