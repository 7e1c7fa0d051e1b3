//! Shared error type across promstats crates.

use thiserror::Error;

/// Stable error codes surfaced to operators (logs, HTTP bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromStatsError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum PromStatsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromStatsError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PromStatsError::BadRequest(_) => ErrorCode::BadRequest,
            PromStatsError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            PromStatsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
