//! Catalog query and detail services.
//!
//! Reads never fail a browse page: a store failure while listing is logged
//! and rendered as an empty page. Detail lookups do fail, with `NotFound`
//! for unknown entries.

use serde::Serialize;

use arcade_core::{
    ArcadeError, CatalogDetail, CatalogEntry, CompiledFilters, FacetGroupView,
    FacetVocabulary, GameId, OwnedGame, PageNav, PageWindow, Principal, Result,
};
use arcade_store::StoreSession;

/// One page of the catalog as shown to the caller.
#[derive(Debug, Serialize)]
pub struct CatalogPage {
    /// Entries on this page, ordered by id.
    pub games: Vec<CatalogEntry>,
    /// Neighbouring page numbers.
    #[serde(flatten)]
    pub nav: PageNav,
    /// Every facet value, with the current selection marked.
    pub facets: Vec<FacetGroupView>,
    /// The selection as a query string, for building page links.
    pub filter_query: String,
}

/// One page of the caller's purchases.
#[derive(Debug, Serialize)]
pub struct LibraryPage {
    /// Owned games, oldest purchase first.
    pub games: Vec<OwnedGame>,
    /// Neighbouring page numbers.
    #[serde(flatten)]
    pub nav: PageNav,
}

/// Fetch one catalog page.
///
/// An unconstrained selection takes the plain ordered scan; anything else
/// goes through the store's filtering procedure.
///
/// # Errors
///
/// Returns `ArcadeError::Query` if the store read fails.
pub async fn list(
    session: &mut dyn StoreSession,
    filters: &CompiledFilters,
    window: PageWindow,
) -> Result<Vec<CatalogEntry>> {
    let rows = if filters.is_unconstrained() {
        session.list_games(window).await
    } else {
        session.filter_games(filters, window).await
    };

    rows.map_err(|e| {
        tracing::error!(error = %e, page = window.page, "Catalog query failed");
        ArcadeError::Query(e.to_string())
    })
}

/// Build the browse page for `filters`.
///
/// Store failures degrade to an empty page (and an empty vocabulary) rather
/// than failing the request.
pub async fn browse(
    session: &mut dyn StoreSession,
    filters: &CompiledFilters,
    page: u32,
) -> CatalogPage {
    let window = PageWindow::catalog(page);

    let games = list(session, filters, window).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, page, "Rendering empty catalog page");
        Vec::new()
    });

    let vocabulary = session.facet_vocabulary().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Facet vocabulary unavailable");
        FacetVocabulary::default()
    });

    CatalogPage {
        nav: window.nav(games.len()),
        games,
        facets: vocabulary.mark(filters),
        filter_query: filter_query(filters),
    }
}

fn filter_query(filters: &CompiledFilters) -> String {
    filters
        .to_pairs()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Resolve one entry for `principal`.
///
/// The purchased flag is looked up on every call.
///
/// # Errors
///
/// - `ArcadeError::NotFound` if the entry does not exist.
/// - `ArcadeError::Query` if a store read fails.
pub async fn detail(
    session: &mut dyn StoreSession,
    game_id: GameId,
    principal: &Principal,
) -> Result<CatalogDetail> {
    let (entry, attributes) = session
        .game_info(game_id)
        .await
        .map_err(|e| ArcadeError::Query(e.to_string()))?
        .ok_or_else(|| ArcadeError::game_not_found(game_id))?;

    let purchased = session
        .has_purchased(principal.account_id, game_id)
        .await
        .map_err(|e| ArcadeError::Query(e.to_string()))?;

    Ok(CatalogDetail {
        entry,
        attributes,
        purchased,
    })
}

/// The principal's purchased games.
pub async fn library(
    session: &mut dyn StoreSession,
    principal: &Principal,
    page: u32,
) -> LibraryPage {
    let window = PageWindow::catalog(page);

    let games = session
        .owned_games(principal.account_id, window)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                account_id = %principal.account_id,
                "Rendering empty library page"
            );
            Vec::new()
        });

    LibraryPage {
        nav: window.nav(games.len()),
        games,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::{AccountId, FacetKind, FacetSelection, Role, CATALOG_PAGE_SIZE};
    use arcade_store::{MemoryStore, SeedGame, Store};
    use chrono::Utc;

    fn entry(id: i64) -> CatalogEntry {
        CatalogEntry {
            id: GameId::new(id),
            name: format!("Game {id}"),
            release_date: None,
            estimated_owners: None,
            price_cents: 999,
            description: None,
            review_score: None,
            platforms: Vec::new(),
            header_image: None,
        }
    }

    async fn store_with_games(count: i64) -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=count {
            let genre = u32::try_from(id % 3).unwrap();
            store
                .insert_game(SeedGame::new(entry(id)).with_facets(FacetKind::Genre, &[genre]))
                .await;
        }
        store
    }

    fn principal() -> Principal {
        Principal {
            subject: "alice".into(),
            account_id: AccountId::new(1),
            role: Role::User,
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn full_page_offers_next_page() {
        let store = store_with_games(25).await;
        let mut session = store.session().await.unwrap();

        let page = browse(session.as_mut(), &CompiledFilters::default(), 1).await;
        assert_eq!(page.games.len(), CATALOG_PAGE_SIZE as usize);
        assert_eq!(page.games[0].id, GameId::new(11));
        assert_eq!(page.prev_and_next(), (0, 2));
    }

    #[tokio::test]
    async fn short_page_stays_on_current_page() {
        let store = store_with_games(25).await;
        let mut session = store.session().await.unwrap();

        let page = browse(session.as_mut(), &CompiledFilters::default(), 2).await;
        assert_eq!(page.games.len(), 5);
        assert_eq!(page.prev_and_next(), (1, 2));
    }

    #[tokio::test]
    async fn listing_is_repeatable() {
        let store = store_with_games(25).await;
        let mut session = store.session().await.unwrap();
        let filters = FacetSelection::from_pairs([("genre", "1")]).compile().unwrap();

        let first = list(session.as_mut(), &filters, PageWindow::catalog(0)).await.unwrap();
        let second = list(session.as_mut(), &filters, PageWindow::catalog(0)).await.unwrap();
        let ids: Vec<_> = first.iter().map(|g| g.id).collect();
        assert_eq!(ids, second.iter().map(|g| g.id).collect::<Vec<_>>());
        assert!(ids.iter().all(|id| id.get() % 3 == 1));
    }

    #[tokio::test]
    async fn store_failure_renders_empty_page() {
        let store = store_with_games(5).await;
        store.set_unavailable(true);
        let mut session = store.session().await.unwrap();

        let filters = CompiledFilters::default();
        assert!(matches!(
            list(session.as_mut(), &filters, PageWindow::catalog(0)).await,
            Err(ArcadeError::Query(_))
        ));

        let page = browse(session.as_mut(), &filters, 0).await;
        assert!(page.games.is_empty());
        assert_eq!(page.prev_and_next(), (0, 0));
    }

    #[tokio::test]
    async fn filter_query_reflects_selection() {
        let store = store_with_games(3).await;
        let mut session = store.session().await.unwrap();
        let filters = FacetSelection::from_pairs([("genre", "2"), ("tag", "7"), ("genre", "1")])
            .compile()
            .unwrap();

        let page = browse(session.as_mut(), &filters, 0).await;
        assert_eq!(page.filter_query, "genre=1&genre=2&tag=7");
    }

    #[tokio::test]
    async fn detail_of_unknown_game_is_not_found() {
        let store = store_with_games(1).await;
        let mut session = store.session().await.unwrap();

        let result = detail(session.as_mut(), GameId::new(99), &principal()).await;
        assert!(matches!(result, Err(ArcadeError::NotFound { .. })));

        let found = detail(session.as_mut(), GameId::new(1), &principal()).await.unwrap();
        assert!(!found.purchased);
    }

    impl CatalogPage {
        fn prev_and_next(&self) -> (u32, u32) {
            (self.nav.prev_page, self.nav.next_page)
        }
    }
}
