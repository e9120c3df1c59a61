//! Common test utilities for arcade integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use axum_test::{TestResponse, TestServer};
use chrono::{DateTime, Utc};

use arcade_core::{
    Account, CatalogEntry, Facet, FacetId, FacetKind, GameAttributes, GameId, Platform, Role,
};
use arcade_service::{create_router, AppState, CredentialHasher, ServiceConfig, SessionCodec};
use arcade_store::{MemoryStore, SeedGame};

/// Signing key shared by the service under test and the harness.
pub const SECRET: &str = "integration-test-secret";

/// Starting balance of the seeded user, in cents.
pub const ALICE_BALANCE: i64 = 2_000;

/// Price of every regular seeded game, in cents.
pub const GAME_PRICE: i64 = 999;

/// A seeded game priced above the user's balance.
pub const EXPENSIVE_GAME: i64 = 42;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for inspecting state.
    pub store: MemoryStore,
    /// A codec keyed like the service's.
    pub codec: SessionCodec,
    /// Regular user `alice` (password `alice-pw`).
    pub alice: Account,
    /// Admin `root` (password `root-pw`).
    pub root: Account,
}

impl TestHarness {
    /// Create a harness over a freshly seeded store.
    ///
    /// Catalog: games 1-12 priced [`GAME_PRICE`] and game 42 priced above
    /// alice's balance.
    ///
    /// | game | genre | category |
    /// |------|-------|----------|
    /// | 1    | 1     | 10       |
    /// | 2    | 2     | 11       |
    /// | 3    | 3     | 10       |
    /// | 4    | 1, 2  | 11       |
    /// | 5-12 | 3     | -        |
    /// | 42   | 3     | 10       |
    pub async fn new() -> Self {
        let hasher = CredentialHasher::with_cost(8, 1, 1).expect("valid argon2 params");
        let store = MemoryStore::new();

        seed_catalog(&store).await;

        let alice = store
            .insert_account(
                "alice",
                hasher.hash("alice-pw").expect("hash"),
                Role::User,
                ALICE_BALANCE,
            )
            .await
            .expect("seed alice");
        let root = store
            .insert_account("root", hasher.hash("root-pw").expect("hash"), Role::Admin, 0)
            .await
            .expect("seed root");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            session_secret: SECRET.into(),
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::new(store.clone()), config).with_hasher(hasher);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            codec: SessionCodec::new(SECRET.as_bytes()),
            alice,
            root,
        }
    }

    /// Cookie header carrying a session for `account` issued at `now`.
    pub fn session_cookie_at(&self, account: &Account, now: DateTime<Utc>) -> HeaderValue {
        let token = self
            .codec
            .issue(&account.username, account.role, Some(account.id), now)
            .expect("issue token");
        HeaderValue::from_str(&format!("Authorization=Bearer%20{token}")).expect("header value")
    }

    /// Cookie header carrying a fresh session for `account`.
    pub fn session_cookie(&self, account: &Account) -> HeaderValue {
        self.session_cookie_at(account, Utc::now())
    }

    /// Cookie header for alice.
    pub fn alice_cookie(&self) -> HeaderValue {
        self.session_cookie(&self.alice)
    }

    /// Cookie header for root.
    pub fn root_cookie(&self) -> HeaderValue {
        self.session_cookie(&self.root)
    }

    /// GET `path` as `account`.
    pub async fn get_as(&self, account: &Account, path: &str) -> TestResponse {
        self.server
            .get(path)
            .add_header(COOKIE, self.session_cookie(account))
            .await
    }

    /// POST a form to `path` as `account`.
    pub async fn post_form_as(
        &self,
        account: &Account,
        path: &str,
        form: &[(&str, &str)],
    ) -> TestResponse {
        self.server
            .post(path)
            .add_header(COOKIE, self.session_cookie(account))
            .form(&form)
            .await
    }
}

async fn seed_catalog(store: &MemoryStore) {
    let layout: [(i64, &[u32], &[u32]); 5] = [
        (1, &[1], &[10]),
        (2, &[2], &[11]),
        (3, &[3], &[10]),
        (4, &[1, 2], &[11]),
        (EXPENSIVE_GAME, &[3], &[10]),
    ];
    for (id, genres, categories) in layout {
        let price = if id == EXPENSIVE_GAME { 5_000 } else { GAME_PRICE };
        let mut game = SeedGame::new(entry(id, price))
            .with_facets(FacetKind::Genre, genres)
            .with_facets(FacetKind::Category, categories);
        if id == 1 {
            game = game.with_attributes(GameAttributes {
                genres: vec!["Action".into()],
                categories: vec!["Single-player".into()],
                developers: vec!["Studio One".into()],
                languages: vec!["English".into(), "French".into()],
                ..GameAttributes::default()
            });
        }
        store.insert_game(game).await;
    }
    for id in 5..=12 {
        store
            .insert_game(SeedGame::new(entry(id, GAME_PRICE)).with_facets(FacetKind::Genre, &[3]))
            .await;
    }

    store
        .set_vocabulary(
            FacetKind::Genre,
            vec![facet(1, "Action"), facet(2, "Indie"), facet(3, "RPG")],
        )
        .await;
    store
        .set_vocabulary(
            FacetKind::Category,
            vec![facet(10, "Single-player"), facet(11, "Multi-player")],
        )
        .await;
}

fn entry(id: i64, price_cents: i64) -> CatalogEntry {
    CatalogEntry {
        id: GameId::new(id),
        name: format!("Game {id}"),
        release_date: None,
        estimated_owners: Some("0 - 20000".into()),
        price_cents,
        description: Some(format!("About game {id}")),
        review_score: None,
        platforms: vec![Platform::Windows],
        header_image: None,
    }
}

fn facet(id: u32, name: &str) -> Facet {
    Facet {
        id: FacetId::new(id),
        name: name.into(),
    }
}

/// Ids of the games in a catalog page body.
pub fn game_ids(body: &serde_json::Value) -> Vec<i64> {
    body["games"]
        .as_array()
        .expect("games array")
        .iter()
        .map(|g| g["id"].as_i64().expect("numeric id"))
        .collect()
}

/// Assert the response sends the caller to the login page and clears the
/// session cookie.
pub fn assert_login_redirect(response: &TestResponse) {
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/login");
    let cookie = response.header(SET_COOKIE);
    let cookie = cookie.to_str().expect("ascii cookie");
    assert!(cookie.starts_with("Authorization=;"), "cookie not cleared: {cookie}");
    assert!(cookie.contains("Max-Age=0"));
}
