use uuid::Uuid;

use crate::types::SequenceNumber;

pub use serde_json::Error as JsonError;
pub use sqlx::Error as SqlxError;

/// Errors raised by the event store and the repository.
///
/// Optimistic concurrency conflicts are not errors: they are reported as
/// [`crate::store::AppendOutcome::Conflict`] and [`crate::SaveOutcome::Conflict`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Sql error. The failed operation left no partially written events behind.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    /// Serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The configured table prefix would not be a plain SQL identifier.
    #[error("invalid table prefix `{0}`: only ASCII alphanumeric characters and underscores are allowed")]
    InvalidTablePrefix(String),
    /// A loaded stream skips or repeats a position.
    #[error("stream {aggregate_type}/{aggregate_id} is not contiguous: expected position {expected}, found {found}")]
    StreamGap {
        aggregate_type: String,
        aggregate_id: Uuid,
        expected: SequenceNumber,
        found: SequenceNumber,
    },
}
