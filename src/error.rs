use sea_orm::{DbErr, SqlErr};

use crate::chunk::ReassemblyError;

/// Error type shared by every store in this crate.
///
/// Database failures from Sea-ORM convert in via `?`; unique-constraint
/// violations that a caller can act on (duplicate email, duplicate chunk row,
/// second feedback verdict) are surfaced as [`StoreError::Conflict`] instead
/// of an opaque backend error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// A uniqueness rule rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The addressed row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write violates a domain invariant (for example enrichment on a
    /// USER message, or an over-long feedback comment).
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// Stored chunk rows for one component are mutually inconsistent.
    #[error("chunk reassembly failed: {0}")]
    Reassembly(#[from] ReassemblyError),

    /// A payload could not be serialized for storage.
    #[error("payload encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Stored data could not be decoded back into a payload.
    #[error("payload decoding failed: {0}")]
    Decode(String),
}

/// Convenience alias used by all store methods.
pub type StoreResult<T> = Result<T, StoreError>;

/// Maps a unique-constraint violation to [`StoreError::Conflict`], passing
/// every other database error through unchanged.
pub(crate) fn conflict_on_unique(err: DbErr, what: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict(what.to_string()),
        _ => StoreError::Database(err),
    }
}
