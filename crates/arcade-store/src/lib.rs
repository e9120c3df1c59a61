//! Storage layer for arcade.
//!
//! The service treats the relational store as an opaque service reached
//! through a fixed query/procedure contract. This crate defines that
//! contract as the [`Store`] and [`StoreSession`] traits and provides two
//! backends:
//!
//! - [`PgStore`]: PostgreSQL through a `sqlx` pool. Each session owns one
//!   pooled connection; every mutation runs in its own transaction.
//! - [`MemoryStore`]: an in-process implementation of the same contract,
//!   used by tests and for running without a database.
//!
//! # Sessions
//!
//! There is no process-wide connection. A request calls [`Store::session`]
//! once, passes the session to every operation it performs, and drops it
//! when done. Dropping releases the underlying connection on every exit
//! path.
//!
//! # Example
//!
//! ```no_run
//! # async fn run(store: &dyn arcade_store::Store) -> arcade_store::Result<()> {
//! use arcade_core::PageWindow;
//!
//! let mut session = store.session().await?;
//! let first_page = session.list_games(PageWindow::catalog(0)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, SeedGame};
pub use postgres::PgStore;

use async_trait::async_trait;

use arcade_core::{
    Account, AccountId, CatalogEntry, CompiledFilters, Credential, FacetVocabulary,
    GameAttributes, GameId, OwnedGame, PageWindow, PurchaseRecord, Role,
};

/// A source of per-request store sessions.
#[async_trait]
pub trait Store: Send + Sync {
    /// Acquire a session scoped to one request.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired.
    async fn session(&self) -> Result<Box<dyn StoreSession>>;
}

/// One request's view of the store.
///
/// Every method is a single query or procedure call. Mutations are atomic:
/// they either commit completely or change nothing.
#[async_trait]
pub trait StoreSession: Send {
    // =========================================================================
    // Catalog Reads
    // =========================================================================

    /// Unfiltered catalog page, ordered by game id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_games(&mut self, window: PageWindow) -> Result<Vec<CatalogEntry>>;

    /// Filtered catalog page: AND across facet kinds, OR within a kind,
    /// ordered by game id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the filtering procedure fails.
    async fn filter_games(
        &mut self,
        filters: &CompiledFilters,
        window: PageWindow,
    ) -> Result<Vec<CatalogEntry>>;

    /// One entry with its detail attributes, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the detail procedure fails.
    async fn game_info(&mut self, game_id: GameId)
        -> Result<Option<(CatalogEntry, GameAttributes)>>;

    /// Whether `account_id` owns `game_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn has_purchased(&mut self, account_id: AccountId, game_id: GameId) -> Result<bool>;

    /// Every facet value, grouped by kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn facet_vocabulary(&mut self) -> Result<FacetVocabulary>;

    /// The purchases of `account_id` joined with catalog data, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn owned_games(
        &mut self,
        account_id: AccountId,
        window: PageWindow,
    ) -> Result<Vec<OwnedGame>>;

    // =========================================================================
    // Account Reads
    // =========================================================================

    /// Look up an account (including its credential) by exact username.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn find_account(&mut self, username: &str) -> Result<Option<Account>>;

    /// Accounts ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_accounts(&mut self, window: PageWindow) -> Result<Vec<Account>>;

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken.
    async fn create_account(
        &mut self,
        username: &str,
        credential: &Credential,
        role: Role,
    ) -> Result<Account>;

    /// Replace the credential of `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account does not exist.
    async fn change_password(&mut self, account_id: AccountId, credential: &Credential)
        -> Result<()>;

    /// Set the role of the account named `username`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account does not exist.
    async fn change_role(&mut self, username: &str, role: Role) -> Result<()>;

    /// Delete the account named `username`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account does not exist.
    async fn delete_account(&mut self, username: &str) -> Result<()>;

    /// Record a purchase and debit the balance in one transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account does not exist.
    /// - `StoreError::Rejected` if the game is unknown, already owned, or
    ///   the balance does not cover the price.
    async fn make_purchase(&mut self, account_id: AccountId, game_id: GameId)
        -> Result<PurchaseRecord>;
}
