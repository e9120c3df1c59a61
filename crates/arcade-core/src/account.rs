//! Account and purchase types.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Platform;
use crate::ids::{AccountId, GameId, PurchaseId};
use crate::principal::Role;

/// Stored credential material for an account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Argon2 PHC string.
    pub password_hash: String,
    /// The salt embedded in `password_hash`, kept alongside for the record.
    pub salt: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// A user account.
///
/// Usernames are unique and case-sensitive; the store enforces uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Store key.
    pub id: AccountId,
    /// Login name.
    pub username: String,
    /// Spendable balance in cents.
    pub balance_cents: i64,
    /// Password hash and salt.
    pub credential: Credential,
    /// Account role.
    pub role: Role,
    /// Registration date.
    pub joined_on: NaiveDate,
}

impl Account {
    /// Whether the balance covers `price_cents`.
    #[must_use]
    pub fn can_afford(&self, price_cents: i64) -> bool {
        self.balance_cents >= price_cents
    }
}

/// An account as shown on the admin roster. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Store key.
    pub id: AccountId,
    /// Login name.
    pub username: String,
    /// Balance in cents.
    pub balance_cents: i64,
    /// Account role.
    pub role: Role,
    /// Registration date.
    pub joined_on: NaiveDate,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            balance_cents: account.balance_cents,
            role: account.role,
            joined_on: account.joined_on,
        }
    }
}

/// One successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Store key.
    pub id: PurchaseId,
    /// Buyer.
    pub account_id: AccountId,
    /// Purchased entry.
    pub game_id: GameId,
    /// Purchase date.
    pub purchased_on: NaiveDate,
    /// Price paid in cents.
    pub price_cents: i64,
}

/// A purchase joined with the catalog data shown in the buyer's library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedGame {
    /// The purchase record.
    pub purchase_id: PurchaseId,
    /// Purchased entry.
    pub game_id: GameId,
    /// Purchase date.
    pub purchased_on: NaiveDate,
    /// Price paid in cents.
    pub price_paid_cents: i64,
    /// Game name.
    pub name: String,
    /// Release date, when known.
    pub release_date: Option<NaiveDate>,
    /// Supported platforms.
    pub platforms: Vec<Platform>,
    /// Metacritic score, when rated.
    pub review_score: Option<i32>,
    /// Header image URL.
    pub header_image: Option<String>,
}
