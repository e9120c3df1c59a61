//! Identifier types for arcade records.
//!
//! Accounts, games and purchases are keyed by store-assigned integers. Each
//! gets its own newtype so an account id can never be passed where a game id
//! is expected.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro generates the newtypes with consistent
//! serialization, parsing, and display behaviour.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input was not a decimal integer.
    #[error("invalid integer id: {0:?}")]
    NotAnInteger(String),

    /// The input was negative.
    #[error("id must not be negative: {0}")]
    Negative(i64),
}

/// Macro to define an `i64`-backed identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as a bare number)
/// - `FromStr`, `Display`, `Debug`
/// - `From<i64>`, `Into<i64>`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(7);
/// let parsed: MyId = "7".parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Return the raw store key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| IdError::NotAnInteger(s.to_string()))?;
                if value < 0 {
                    return Err(IdError::Negative(value));
                }
                Ok(Self(value))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id_type!(AccountId, "An account identifier (`user.user_id`).");
int_id_type!(GameId, "A catalog entry identifier (`game.game_id`).");
int_id_type!(PurchaseId, "A purchase record identifier (`purchases.purchase_id`).");

/// A facet identifier (genre, category, tag, language, developer or publisher id).
///
/// Facet ids are small non-negative integers. Parsing is the trust boundary
/// for values that later end up in the filtering procedure's parameters, so
/// only plain decimal digits are accepted: no sign, no whitespace, no
/// separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetId(u32);

impl FacetId {
    /// Wrap a raw facet id.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw facet id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for FacetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NotAnInteger(s.to_string()));
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| IdError::NotAnInteger(s.to_string()))
    }
}

impl fmt::Display for FacetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
