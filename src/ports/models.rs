//! Common error type for all ports

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error hierarchy for external lookups
///
/// Transport failures are retryable; data and configuration failures are not.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceError {
    /// Network/communication error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Non-2xx response
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response body was not the expected JSON document
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Well-formed response without the data we need
    #[error("Data error: {0}")]
    Data(String),

    /// Adapter cannot run as configured (missing key, bad URL)
    #[error("Adapter configuration error: {0}")]
    Config(String),
}

impl SourceError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Transport(_)
                | SourceError::Timeout(_)
                | SourceError::HttpStatus { .. }
                | SourceError::RateLimited
                | SourceError::Malformed(_)
        )
    }
}
