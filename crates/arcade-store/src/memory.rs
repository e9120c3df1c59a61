//! In-memory storage implementation.
//!
//! `MemoryStore` implements the full store contract over in-process tables:
//! AND-of-OR facet filtering, id-ordered paging, username uniqueness and the
//! purchase rules. Every session call takes the table lock once, so each
//! mutation is atomic with respect to concurrent sessions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use arcade_core::{
    Account, AccountId, CatalogEntry, CompiledFilters, Credential, FacetId, FacetKind,
    FacetVocabulary, GameAttributes, GameId, OwnedGame, PageWindow, PurchaseId, PurchaseRecord,
    Role,
};

use crate::error::{Result, StoreError};
use crate::{Store, StoreSession};

/// A catalog entry together with everything the store knows about it.
#[derive(Debug, Clone)]
pub struct SeedGame {
    /// The listed entry.
    pub entry: CatalogEntry,
    /// Detail attributes.
    pub attributes: GameAttributes,
    /// Facet ids attached to the entry, per kind.
    pub facets: BTreeMap<FacetKind, BTreeSet<FacetId>>,
}

impl SeedGame {
    /// A game with no attributes or facets.
    #[must_use]
    pub fn new(entry: CatalogEntry) -> Self {
        Self {
            entry,
            attributes: GameAttributes::default(),
            facets: BTreeMap::new(),
        }
    }

    /// Attach facet ids of `kind`.
    #[must_use]
    pub fn with_facets(mut self, kind: FacetKind, ids: &[u32]) -> Self {
        self.facets
            .entry(kind)
            .or_default()
            .extend(ids.iter().copied().map(FacetId::new));
        self
    }

    /// Replace the detail attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: GameAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    fn matches(&self, filters: &CompiledFilters) -> bool {
        FacetKind::ALL.into_iter().all(|kind| {
            let mut wanted = filters.ids(kind).peekable();
            if wanted.peek().is_none() {
                return true;
            }
            let held = self.facets.get(&kind);
            wanted.any(|id| held.is_some_and(|set| set.contains(&id)))
        })
    }
}

#[derive(Default)]
struct Tables {
    games: BTreeMap<GameId, SeedGame>,
    vocabulary: FacetVocabulary,
    accounts: BTreeMap<AccountId, Account>,
    purchases: Vec<PurchaseRecord>,
    next_account_id: i64,
    next_purchase_id: i64,
}

impl Tables {
    fn account_by_name(&self, username: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.username == username)
    }

    fn account_id_by_name(&self, username: &str) -> Result<AccountId> {
        self.account_by_name(username)
            .map(|a| a.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                key: username.to_string(),
            })
    }

    fn owns(&self, account_id: AccountId, game_id: GameId) -> bool {
        self.purchases
            .iter()
            .any(|p| p.account_id == account_id && p.game_id == game_id)
    }
}

struct Inner {
    tables: Mutex<Tables>,
    open_sessions: AtomicUsize,
    reads_down: AtomicBool,
    writes_down: AtomicBool,
}

/// In-process storage for tests and database-less runs.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables {
                    next_account_id: 1,
                    next_purchase_id: 1,
                    ..Tables::default()
                }),
                open_sessions: AtomicUsize::new(0),
                reads_down: AtomicBool::new(false),
                writes_down: AtomicBool::new(false),
            }),
        }
    }

    /// Insert or replace a catalog entry.
    pub async fn insert_game(&self, game: SeedGame) {
        let mut tables = self.inner.tables.lock().await;
        tables.games.insert(game.entry.id, game);
    }

    /// Replace the facet values of `kind`.
    pub async fn set_vocabulary(&self, kind: FacetKind, facets: Vec<arcade_core::Facet>) {
        self.inner.tables.lock().await.vocabulary.set(kind, facets);
    }

    /// Insert an account directly, bypassing registration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken.
    pub async fn insert_account(
        &self,
        username: &str,
        credential: Credential,
        role: Role,
        balance_cents: i64,
    ) -> Result<Account> {
        let mut tables = self.inner.tables.lock().await;
        let mut account = insert_account(&mut tables, username, &credential, role)?;
        account.balance_cents = balance_cents;
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Look up an account outside of any session.
    pub async fn account(&self, username: &str) -> Option<Account> {
        self.inner
            .tables
            .lock()
            .await
            .account_by_name(username)
            .cloned()
    }

    /// Number of accounts.
    pub async fn account_count(&self) -> usize {
        self.inner.tables.lock().await.accounts.len()
    }

    /// Number of purchase records.
    pub async fn purchase_count(&self) -> usize {
        self.inner.tables.lock().await.purchases.len()
    }

    /// Sessions acquired and not yet dropped.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// Make every session call fail with a database error, simulating an
    /// outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.set_reads_unavailable(unavailable);
        self.set_writes_unavailable(unavailable);
    }

    /// Fail reads only. Mutations still commit.
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.inner.reads_down.store(unavailable, Ordering::SeqCst);
    }

    /// Fail mutations only. Reads still succeed.
    pub fn set_writes_unavailable(&self, unavailable: bool) {
        self.inner.writes_down.store(unavailable, Ordering::SeqCst);
    }
}

fn insert_account(
    tables: &mut Tables,
    username: &str,
    credential: &Credential,
    role: Role,
) -> Result<Account> {
    if tables.account_by_name(username).is_some() {
        return Err(StoreError::Conflict(format!(
            "username already exists: {username}"
        )));
    }
    let account = Account {
        id: AccountId::new(tables.next_account_id),
        username: username.to_string(),
        balance_cents: 0,
        credential: credential.clone(),
        role,
        joined_on: Utc::now().date_naive(),
    };
    tables.next_account_id += 1;
    tables.accounts.insert(account.id, account.clone());
    Ok(account)
}

fn page<T>(rows: impl Iterator<Item = T>, window: PageWindow) -> Vec<T> {
    let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit()).unwrap_or(usize::MAX);
    rows.skip(offset).take(limit).collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn session(&self) -> Result<Box<dyn StoreSession>> {
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemorySession {
    inner: Arc<Inner>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemorySession {
    fn check_readable(&self) -> Result<()> {
        Self::check(&self.inner.reads_down)
    }

    fn check_writable(&self) -> Result<()> {
        Self::check(&self.inner.writes_down)
    }

    fn check(down: &AtomicBool) -> Result<()> {
        if down.load(Ordering::SeqCst) {
            Err(StoreError::Database("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn list_games(&mut self, window: PageWindow) -> Result<Vec<CatalogEntry>> {
        self.check_readable()?;
        let tables = self.inner.tables.lock().await;
        Ok(page(tables.games.values().map(|g| g.entry.clone()), window))
    }

    async fn filter_games(
        &mut self,
        filters: &CompiledFilters,
        window: PageWindow,
    ) -> Result<Vec<CatalogEntry>> {
        self.check_readable()?;
        let tables = self.inner.tables.lock().await;
        let rows = tables
            .games
            .values()
            .filter(|g| g.matches(filters))
            .map(|g| g.entry.clone());
        Ok(page(rows, window))
    }

    async fn game_info(
        &mut self,
        game_id: GameId,
    ) -> Result<Option<(CatalogEntry, GameAttributes)>> {
        self.check_readable()?;
        let tables = self.inner.tables.lock().await;
        Ok(tables
            .games
            .get(&game_id)
            .map(|g| (g.entry.clone(), g.attributes.clone())))
    }

    async fn has_purchased(&mut self, account_id: AccountId, game_id: GameId) -> Result<bool> {
        self.check_readable()?;
        Ok(self.inner.tables.lock().await.owns(account_id, game_id))
    }

    async fn facet_vocabulary(&mut self) -> Result<FacetVocabulary> {
        self.check_readable()?;
        Ok(self.inner.tables.lock().await.vocabulary.clone())
    }

    async fn owned_games(
        &mut self,
        account_id: AccountId,
        window: PageWindow,
    ) -> Result<Vec<OwnedGame>> {
        self.check_readable()?;
        let tables = self.inner.tables.lock().await;
        let rows = tables
            .purchases
            .iter()
            .filter(|p| p.account_id == account_id)
            .filter_map(|p| {
                let game = &tables.games.get(&p.game_id)?.entry;
                Some(OwnedGame {
                    purchase_id: p.id,
                    game_id: p.game_id,
                    purchased_on: p.purchased_on,
                    price_paid_cents: p.price_cents,
                    name: game.name.clone(),
                    release_date: game.release_date,
                    platforms: game.platforms.clone(),
                    review_score: game.review_score,
                    header_image: game.header_image.clone(),
                })
            });
        Ok(page(rows, window))
    }

    async fn find_account(&mut self, username: &str) -> Result<Option<Account>> {
        self.check_readable()?;
        Ok(self
            .inner
            .tables
            .lock()
            .await
            .account_by_name(username)
            .cloned())
    }

    async fn list_accounts(&mut self, window: PageWindow) -> Result<Vec<Account>> {
        self.check_readable()?;
        let tables = self.inner.tables.lock().await;
        Ok(page(tables.accounts.values().cloned(), window))
    }

    async fn create_account(
        &mut self,
        username: &str,
        credential: &Credential,
        role: Role,
    ) -> Result<Account> {
        self.check_writable()?;
        let mut tables = self.inner.tables.lock().await;
        insert_account(&mut tables, username, credential, role)
    }

    async fn change_password(
        &mut self,
        account_id: AccountId,
        credential: &Credential,
    ) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.inner.tables.lock().await;
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                key: account_id.to_string(),
            })?;
        account.credential = credential.clone();
        Ok(())
    }

    async fn change_role(&mut self, username: &str, role: Role) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.inner.tables.lock().await;
        let id = tables.account_id_by_name(username)?;
        if let Some(account) = tables.accounts.get_mut(&id) {
            account.role = role;
        }
        Ok(())
    }

    async fn delete_account(&mut self, username: &str) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.inner.tables.lock().await;
        let id = tables.account_id_by_name(username)?;
        tables.accounts.remove(&id);
        tables.purchases.retain(|p| p.account_id != id);
        Ok(())
    }

    async fn make_purchase(
        &mut self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<PurchaseRecord> {
        self.check_writable()?;
        let mut tables = self.inner.tables.lock().await;

        let price_cents = tables
            .games
            .get(&game_id)
            .map(|g| g.entry.price_cents)
            .ok_or_else(|| StoreError::Rejected(format!("unknown game {game_id}")))?;
        let buyer = tables
            .accounts
            .get(&account_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                key: account_id.to_string(),
            })?;

        if tables.owns(account_id, game_id) {
            return Err(StoreError::Rejected(format!("game {game_id} already owned")));
        }
        if !buyer.can_afford(price_cents) {
            return Err(StoreError::Rejected(format!(
                "insufficient balance: balance={}, price={price_cents}",
                buyer.balance_cents
            )));
        }

        let record = PurchaseRecord {
            id: PurchaseId::new(tables.next_purchase_id),
            account_id,
            game_id,
            purchased_on: Utc::now().date_naive(),
            price_cents,
        };
        tables.next_purchase_id += 1;
        if let Some(account) = tables.accounts.get_mut(&account_id) {
            account.balance_cents -= price_cents;
        }
        tables.purchases.push(record.clone());
        Ok(record)
    }
}
