//! Error types for `DocQL`.
//!
//! This module provides a unified error type for filter compilation, vector
//! search construction and the in-process executor. Client-caused errors are
//! raised at construction time so that a built condition or query is always
//! internally consistent.

use thiserror::Error;

/// Result type alias for `DocQL` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `DocQL` operations.
///
/// Error codes follow the pattern `DOCQL-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid filter (DOCQL-001).
    ///
    /// Empty or unsupported literal, unknown operator, bad path, or a
    /// condition handed to a builder that cannot render it.
    #[error("[DOCQL-001] Invalid filter: {0}")]
    InvalidFilter(String),

    /// Operation has no supported form (DOCQL-002).
    #[error("[DOCQL-002] Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Dimension mismatch (DOCQL-003).
    #[error("[DOCQL-003] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Invalid vector (DOCQL-004).
    #[error("[DOCQL-004] Invalid vector: {0}")]
    InvalidVector(String),

    /// Invalid search request (DOCQL-005).
    #[error("[DOCQL-005] Invalid search request: {0}")]
    InvalidRequest(String),

    /// Document cannot be shredded (DOCQL-006).
    #[error("[DOCQL-006] Invalid document: {0}")]
    InvalidDocument(String),

    /// Query builder used in an incomplete state (DOCQL-007).
    #[error("[DOCQL-007] Invalid query state: {0}")]
    QueryState(String),

    /// Configuration error (DOCQL-008).
    #[error("[DOCQL-008] Configuration error: {0}")]
    Config(String),

    /// Serialization error (DOCQL-009).
    #[error("[DOCQL-009] Serialization error: {0}")]
    Serialization(String),

    /// Storage execution error (DOCQL-010).
    #[error("[DOCQL-010] Execution error: {0}")]
    Execution(String),

    /// Internal error (DOCQL-011).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[DOCQL-011] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "DOCQL-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "DOCQL-001",
            Self::UnsupportedOperation(_) => "DOCQL-002",
            Self::DimensionMismatch { .. } => "DOCQL-003",
            Self::InvalidVector(_) => "DOCQL-004",
            Self::InvalidRequest(_) => "DOCQL-005",
            Self::InvalidDocument(_) => "DOCQL-006",
            Self::QueryState(_) => "DOCQL-007",
            Self::Config(_) => "DOCQL-008",
            Self::Serialization(_) => "DOCQL-009",
            Self::Execution(_) => "DOCQL-010",
            Self::Internal(_) => "DOCQL-011",
        }
    }

    /// Returns true if the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilter(_)
                | Self::UnsupportedOperation(_)
                | Self::DimensionMismatch { .. }
                | Self::InvalidVector(_)
                | Self::InvalidRequest(_)
                | Self::InvalidDocument(_)
        )
    }

    /// Returns the HTTP-equivalent status code for surfacing this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
