//! Error types for arcade operations.

use crate::ids::IdError;

/// Result type for arcade operations.
pub type Result<T> = std::result::Result<T, ArcadeError>;

/// Errors that can occur while serving catalog reads and account mutations.
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    /// A session token could not be issued or decoded.
    #[error("identity error: {0}")]
    Identity(String),

    /// The request carried no usable session credential.
    #[error("unauthorized")]
    Unauthorized,

    /// The principal's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A facet id in a browse request was not a non-negative integer.
    #[error("invalid filter: {kind} id {value:?}")]
    InvalidFilter {
        /// The facet parameter that carried the bad id.
        kind: String,
        /// The rejected raw value.
        value: String,
    },

    /// An entry or account does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The key used for the lookup.
        key: String,
    },

    /// A store read failed.
    #[error("query error: {0}")]
    Query(String),

    /// The store rejected a purchase.
    #[error("purchase failed: {0}")]
    Purchase(String),

    /// A form field was blank or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A uniquely keyed record already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other failure (store write, credential hashing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ArcadeError {
    /// Shorthand for an unknown catalog entry.
    #[must_use]
    pub fn game_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "game",
            key: key.to_string(),
        }
    }

    /// Shorthand for an unknown account.
    #[must_use]
    pub fn account_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "account",
            key: key.to_string(),
        }
    }
}

impl From<IdError> for ArcadeError {
    fn from(err: IdError) -> Self {
        Self::Identity(err.to_string())
    }
}
