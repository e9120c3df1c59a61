//! PostgreSQL storage implementation.
//!
//! This module provides the `PgStore` implementation of the `Store` trait.
//! All values are bound as query parameters; only the fixed relation and
//! procedure names from [`crate::schema`] are spliced into SQL text.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, FromRow, PgPool, Postgres};

use arcade_core::{
    split_list, Account, AccountId, CatalogEntry, CompiledFilters, Credential, Facet, FacetId,
    FacetKind, FacetVocabulary, GameAttributes, GameId, OwnedGame, PageWindow, Platform,
    PurchaseId, PurchaseRecord, Role,
};

use crate::error::{Result, StoreError};
use crate::schema::{proc, sqlstate, table, GAME_COLUMNS, USER_COLUMNS};
use crate::{Store, StoreSession};

/// How long a request waits for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed storage.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool of at most `max_connections` to `database_url`.
    ///
    /// The pool is lazy: no connection is opened until the first session.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(database_url)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn session(&self) -> Result<Box<dyn StoreSession>> {
        let conn = self.pool.acquire().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to acquire database connection");
            StoreError::from(e)
        })?;
        Ok(Box::new(PgSession { conn }))
    }
}

/// One pooled connection, returned to the pool on drop.
struct PgSession {
    conn: PoolConnection<Postgres>,
}

// ============================================================================
// Row Records
// ============================================================================

#[derive(FromRow)]
struct GameRecord {
    game_id: i64,
    game_name: String,
    release_date: Option<NaiveDate>,
    estimated_owners: Option<String>,
    price_cents: i64,
    about_game: Option<String>,
    metacritic_score: Option<i32>,
    platform_support: Option<String>,
    header_image: Option<String>,
}

impl GameRecord {
    fn into_domain(self) -> CatalogEntry {
        CatalogEntry {
            id: GameId::new(self.game_id),
            name: self.game_name,
            release_date: self.release_date,
            estimated_owners: self.estimated_owners,
            price_cents: self.price_cents,
            description: self.about_game,
            review_score: self.metacritic_score,
            platforms: self
                .platform_support
                .as_deref()
                .map(Platform::decode_flags)
                .unwrap_or_default(),
            header_image: self.header_image,
        }
    }
}

#[derive(FromRow)]
struct GameInfoRecord {
    #[sqlx(flatten)]
    game: GameRecord,
    video_urls: Option<String>,
    categories: Option<String>,
    genres: Option<String>,
    tags: Option<String>,
    supported_langs: Option<String>,
    supported_audio_langs: Option<String>,
    developers: Option<String>,
    publishers: Option<String>,
}

impl GameInfoRecord {
    fn into_domain(self) -> (CatalogEntry, GameAttributes) {
        let attributes = GameAttributes {
            videos: split_list(self.video_urls.as_deref()),
            categories: split_list(self.categories.as_deref()),
            genres: split_list(self.genres.as_deref()),
            tags: split_list(self.tags.as_deref()),
            languages: split_list(self.supported_langs.as_deref()),
            audio_languages: split_list(self.supported_audio_langs.as_deref()),
            developers: split_list(self.developers.as_deref()),
            publishers: split_list(self.publishers.as_deref()),
        };
        (self.game.into_domain(), attributes)
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: i64,
    username: String,
    balance_cents: i64,
    password_hash: String,
    salt: String,
    user_role: String,
    date_joined: NaiveDate,
}

impl UserRecord {
    fn into_domain(self) -> Result<Account> {
        let role = self
            .user_role
            .parse::<Role>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Account {
            id: AccountId::new(self.user_id),
            username: self.username,
            balance_cents: self.balance_cents,
            credential: Credential {
                password_hash: self.password_hash,
                salt: self.salt,
            },
            role,
            joined_on: self.date_joined,
        })
    }
}

#[derive(FromRow)]
struct PurchaseRow {
    purchase_id: i64,
    user_id: i64,
    game_id: i64,
    purchase_date: NaiveDate,
    purchase_price_cents: i64,
}

impl PurchaseRow {
    fn into_domain(self) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseId::new(self.purchase_id),
            account_id: AccountId::new(self.user_id),
            game_id: GameId::new(self.game_id),
            purchased_on: self.purchase_date,
            price_cents: self.purchase_price_cents,
        }
    }
}

#[derive(FromRow)]
struct OwnedGameRecord {
    purchase_id: i64,
    game_id: i64,
    purchase_date: NaiveDate,
    purchase_price_cents: i64,
    game_name: String,
    release_date: Option<NaiveDate>,
    platform_support: Option<String>,
    metacritic_score: Option<i32>,
    header_image: Option<String>,
}

impl OwnedGameRecord {
    fn into_domain(self) -> OwnedGame {
        OwnedGame {
            purchase_id: PurchaseId::new(self.purchase_id),
            game_id: GameId::new(self.game_id),
            purchased_on: self.purchase_date,
            price_paid_cents: self.purchase_price_cents,
            name: self.game_name,
            release_date: self.release_date,
            platforms: self
                .platform_support
                .as_deref()
                .map(Platform::decode_flags)
                .unwrap_or_default(),
            review_score: self.metacritic_score,
            header_image: self.header_image,
        }
    }
}

#[derive(FromRow)]
struct FacetRecord {
    facet_kind: String,
    facet_id: i32,
    facet_name: String,
}

/// Translate a procedure failure using its SQLSTATE.
fn procedure_error(err: sqlx::Error, account_key: impl ToString) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(sqlstate::UNIQUE_VIOLATION) => {
                return StoreError::Conflict(db.message().to_string())
            }
            Some(sqlstate::NO_DATA_FOUND) => {
                return StoreError::NotFound {
                    entity: "account",
                    key: account_key.to_string(),
                }
            }
            Some(sqlstate::RAISE_EXCEPTION) => {
                return StoreError::Rejected(db.message().to_string())
            }
            _ => {}
        }
    }
    StoreError::from(err)
}

fn require_found(found: bool, entity: &'static str, key: impl ToString) -> Result<()> {
    if found {
        Ok(())
    } else {
        Err(StoreError::NotFound {
            entity,
            key: key.to_string(),
        })
    }
}

// ============================================================================
// `StoreSession` Implementation
// ============================================================================

#[async_trait]
impl StoreSession for PgSession {
    async fn list_games(&mut self, window: PageWindow) -> Result<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM {} ORDER BY game_id ASC LIMIT $1 OFFSET $2",
            table::GAME
        );
        let records = sqlx::query_as::<_, GameRecord>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(records.into_iter().map(GameRecord::into_domain).collect())
    }

    async fn filter_games(
        &mut self,
        filters: &CompiledFilters,
        window: PageWindow,
    ) -> Result<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM {}($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ORDER BY game_id ASC",
            proc::FILTER_GAMES
        );
        let mut query = sqlx::query_as::<_, GameRecord>(&sql);
        for param in filters.params() {
            query = query.bind(param);
        }
        let records = query
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(records.into_iter().map(GameRecord::into_domain).collect())
    }

    async fn game_info(
        &mut self,
        game_id: GameId,
    ) -> Result<Option<(CatalogEntry, GameAttributes)>> {
        let sql = format!("SELECT * FROM {}($1)", proc::GET_GAME_INFO);
        let record = sqlx::query_as::<_, GameInfoRecord>(&sql)
            .bind(game_id.get())
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(record.map(GameInfoRecord::into_domain))
    }

    async fn has_purchased(&mut self, account_id: AccountId, game_id: GameId) -> Result<bool> {
        let sql = format!("SELECT {}($1, $2) > 0", proc::HAS_PURCHASED);
        let purchased = sqlx::query_scalar::<_, bool>(&sql)
            .bind(account_id.get())
            .bind(game_id.get())
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(purchased)
    }

    async fn facet_vocabulary(&mut self) -> Result<FacetVocabulary> {
        let sql = format!(
            "SELECT facet_kind, facet_id, facet_name FROM {} ORDER BY facet_kind, facet_name",
            table::FACET_VOCABULARY
        );
        let records = sqlx::query_as::<_, FacetRecord>(&sql)
            .fetch_all(&mut *self.conn)
            .await?;

        let mut groups: std::collections::BTreeMap<FacetKind, Vec<Facet>> = Default::default();
        for record in records {
            let Ok(kind) = record.facet_kind.parse::<FacetKind>() else {
                tracing::warn!(kind = %record.facet_kind, "Skipping unknown facet kind");
                continue;
            };
            let id = u32::try_from(record.facet_id)
                .map_err(|_| StoreError::Decode(format!("negative facet id {}", record.facet_id)))?;
            groups.entry(kind).or_default().push(Facet {
                id: FacetId::new(id),
                name: record.facet_name,
            });
        }

        let mut vocabulary = FacetVocabulary::default();
        for (kind, facets) in groups {
            vocabulary.set(kind, facets);
        }
        Ok(vocabulary)
    }

    async fn owned_games(
        &mut self,
        account_id: AccountId,
        window: PageWindow,
    ) -> Result<Vec<OwnedGame>> {
        let sql = format!(
            "SELECT p.purchase_id, p.game_id, p.purchase_date, p.purchase_price_cents, \
                    g.game_name, g.release_date, g.platform_support, g.metacritic_score, \
                    g.header_image \
             FROM {} p JOIN {} g ON p.game_id = g.game_id \
             WHERE p.user_id = $1 \
             ORDER BY p.purchase_id ASC LIMIT $2 OFFSET $3",
            table::PURCHASES,
            table::GAME
        );
        let records = sqlx::query_as::<_, OwnedGameRecord>(&sql)
            .bind(account_id.get())
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(records.into_iter().map(OwnedGameRecord::into_domain).collect())
    }

    async fn find_account(&mut self, username: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM {} WHERE username = $1", table::USER);
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await?
            .map(UserRecord::into_domain)
            .transpose()
    }

    async fn list_accounts(&mut self, window: PageWindow) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM {} ORDER BY user_id ASC LIMIT $1 OFFSET $2",
            table::USER
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&mut *self.conn)
            .await?
            .into_iter()
            .map(UserRecord::into_domain)
            .collect()
    }

    async fn create_account(
        &mut self,
        username: &str,
        credential: &Credential,
        role: Role,
    ) -> Result<Account> {
        let sql = format!("SELECT {USER_COLUMNS} FROM {}($1, $2, $3, $4)", proc::ADD_USER);
        let mut tx = Connection::begin(&mut *self.conn).await?;
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .bind(&credential.password_hash)
            .bind(&credential.salt)
            .bind(role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| procedure_error(e, username))?;
        tx.commit().await?;
        record.into_domain()
    }

    async fn change_password(
        &mut self,
        account_id: AccountId,
        credential: &Credential,
    ) -> Result<()> {
        let sql = format!("SELECT {}($1, $2, $3)", proc::CHANGE_PASSWORD);
        let mut tx = Connection::begin(&mut *self.conn).await?;
        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(account_id.get())
            .bind(&credential.password_hash)
            .bind(&credential.salt)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| procedure_error(e, account_id))?;
        tx.commit().await?;
        require_found(found, "account", account_id)
    }

    async fn change_role(&mut self, username: &str, role: Role) -> Result<()> {
        let sql = format!("SELECT {}($1, $2)", proc::CHANGE_ROLE);
        let mut tx = Connection::begin(&mut *self.conn).await?;
        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(username)
            .bind(role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| procedure_error(e, username))?;
        tx.commit().await?;
        require_found(found, "account", username)
    }

    async fn delete_account(&mut self, username: &str) -> Result<()> {
        let sql = format!("SELECT {}($1)", proc::DELETE_USER);
        let mut tx = Connection::begin(&mut *self.conn).await?;
        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(username)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| procedure_error(e, username))?;
        tx.commit().await?;
        require_found(found, "account", username)
    }

    async fn make_purchase(
        &mut self,
        account_id: AccountId,
        game_id: GameId,
    ) -> Result<PurchaseRecord> {
        let sql = format!(
            "SELECT purchase_id, user_id, game_id, purchase_date, purchase_price_cents \
             FROM {}($1, $2)",
            proc::MAKE_PURCHASE
        );
        let mut tx = Connection::begin(&mut *self.conn).await?;
        let row = sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(account_id.get())
            .bind(game_id.get())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| procedure_error(e, account_id))?;
        tx.commit().await?;
        Ok(row.into_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_record(platform_support: Option<&str>) -> GameRecord {
        GameRecord {
            game_id: 7,
            game_name: "Seven".into(),
            release_date: NaiveDate::from_ymd_opt(2020, 1, 2),
            estimated_owners: Some("0 - 20000".into()),
            price_cents: 1999,
            about_game: Some("About".into()),
            metacritic_score: Some(88),
            platform_support: platform_support.map(str::to_string),
            header_image: None,
        }
    }

    fn user_record(role: &str) -> UserRecord {
        UserRecord {
            user_id: 3,
            username: "alice".into(),
            balance_cents: 500,
            password_hash: "hash".into(),
            salt: "salt".into(),
            user_role: role.into(),
            date_joined: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        }
    }

    #[test]
    fn game_record_decodes_platform_flags() {
        let entry = game_record(Some("101")).into_domain();
        assert_eq!(entry.id, GameId::new(7));
        assert_eq!(entry.description.as_deref(), Some("About"));
        assert_eq!(entry.review_score, Some(88));
        assert_eq!(entry.platforms, vec![Platform::Windows, Platform::Linux]);

        assert!(game_record(None).into_domain().platforms.is_empty());
    }

    #[test]
    fn game_info_record_splits_lists() {
        let record = GameInfoRecord {
            game: game_record(Some("010")),
            video_urls: None,
            categories: Some("Single-player, Co-op".into()),
            genres: Some("Action".into()),
            tags: Some("".into()),
            supported_langs: Some("English,French,".into()),
            supported_audio_langs: None,
            developers: Some("Studio".into()),
            publishers: None,
        };

        let (entry, attributes) = record.into_domain();
        assert_eq!(entry.platforms, vec![Platform::Mac]);
        assert_eq!(attributes.categories, vec!["Single-player", "Co-op"]);
        assert_eq!(attributes.languages, vec!["English", "French"]);
        assert!(attributes.tags.is_empty());
        assert!(attributes.videos.is_empty());
    }

    #[test]
    fn user_record_parses_role() {
        let account = user_record("admin").into_domain().unwrap();
        assert_eq!(account.role, Role::Admin);
        assert_eq!(account.id, AccountId::new(3));
        assert_eq!(account.credential.salt, "salt");

        let result = user_record("superuser").into_domain();
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn purchase_row_maps_ids() {
        let record = PurchaseRow {
            purchase_id: 11,
            user_id: 3,
            game_id: 7,
            purchase_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            purchase_price_cents: 1999,
        }
        .into_domain();
        assert_eq!(record.id, PurchaseId::new(11));
        assert_eq!(record.account_id, AccountId::new(3));
        assert_eq!(record.game_id, GameId::new(7));
        assert_eq!(record.price_cents, 1999);
    }

    #[test]
    fn missing_rows_become_not_found() {
        assert!(require_found(true, "account", "alice").is_ok());
        let result = require_found(false, "account", "alice");
        assert_eq!(result.unwrap_err().to_string(), "account not found: alice");
    }

    #[test]
    fn non_procedure_errors_pass_through() {
        let err = procedure_error(sqlx::Error::RowNotFound, "alice");
        assert!(matches!(err, StoreError::Database(_)));

        let err = procedure_error(sqlx::Error::ColumnNotFound("salt".into()), "alice");
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn lazy_pool_rejects_bad_urls_without_connecting() {
        assert!(PgStore::connect_lazy("postgres://arcade@localhost:5432/arcade", 2).is_ok());
        assert!(matches!(
            PgStore::connect_lazy("not a url", 2),
            Err(StoreError::Database(_))
        ));
    }
}
