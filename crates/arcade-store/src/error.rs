//! Error types for arcade storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed (connection, protocol, unexpected SQL error).
    #[error("database error: {0}")]
    Database(String),

    /// A row came back in a shape the contract does not allow.
    #[error("decode error: {0}")]
    Decode(String),

    /// A keyed record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The key used for the lookup.
        key: String,
    },

    /// A procedure refused the operation (insufficient balance, already owned, ...).
    #[error("rejected: {0}")]
    Rejected(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                Self::Decode(err.to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}
