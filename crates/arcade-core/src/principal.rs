//! Authenticated principals and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ArcadeError, Result};
use crate::ids::AccountId;

/// The role carried by an account and by every session token issued for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses and purchases.
    User,
    /// Additionally manages accounts and roles.
    Admin,
}

impl Role {
    /// The role name as stored and as carried in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ArcadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ArcadeError::Identity(format!("unknown role: {other:?}"))),
        }
    }
}

/// The identity a request acts as.
///
/// Only produced by decoding a valid session token; lives for one request
/// and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The username the token was issued to.
    pub subject: String,
    /// The account the token was issued for.
    pub account_id: AccountId,
    /// The role at issuance time.
    pub role: Role,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    /// Whether this principal holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the principal holds `role`.
    ///
    /// The role checked is the one decoded from the session token. Callers
    /// must never pass a role taken from request input here.
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::Forbidden` when the roles differ.
    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ArcadeError::Forbidden(format!(
                "{} requires role {role}, has {}",
                self.subject, self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            subject: "alice".into(),
            account_id: AccountId::new(1),
            role,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("Admin".parse::<Role>().is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn require_role_matches_exactly() {
        assert!(principal(Role::Admin).require_role(Role::Admin).is_ok());
        assert!(matches!(
            principal(Role::User).require_role(Role::Admin),
            Err(ArcadeError::Forbidden(_))
        ));
        assert!(matches!(
            principal(Role::Admin).require_role(Role::User),
            Err(ArcadeError::Forbidden(_))
        ));
    }
}
