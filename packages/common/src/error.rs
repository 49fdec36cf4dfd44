use std::time::Duration;

use thiserror::Error;

/// Invalid catalog identities and query parameters.
///
/// Every variant is a client input problem: callers surface the message and
/// never retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("filter must be one of \"zg\", \"zr\", \"zi\" (got {0:?})")]
    InvalidFilter(String),

    #[error("{name} must be between {min} and {max} (got {value})")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid object ID {oid:?}: {reason}")]
    InvalidObjectId { oid: String, reason: &'static str },

    #[error("{0}")]
    InvalidCone(String),
}

/// Failures raised by a catalog storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "sea-orm")]
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write was refused and nothing was changed.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A stored row could not be mapped back into catalog types.
    #[error("corrupt stored row: {0}")]
    Corrupt(String),
}
