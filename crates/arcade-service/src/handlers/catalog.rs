//! Catalog browse and detail handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Serialize;

use arcade_core::{AccountSummary, CatalogDetail, FacetSelection, GameId, PurchaseRecord};

use crate::auth::AuthUser;
use crate::catalog::{self, CatalogPage, LibraryPage};
use crate::error::ApiError;
use crate::handlers::admin::roster_page;
use crate::state::AppState;

/// Home page, shaped by the caller's role.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum HomeView {
    /// What a regular user sees.
    User(UserView),
    /// What an admin sees: the catalog plus the account roster.
    Admin(AdminView),
}

/// Home page for `user` principals.
#[derive(Debug, Serialize)]
pub struct UserView {
    /// The caller's username.
    pub username: String,
    /// The requested catalog page.
    #[serde(flatten)]
    pub catalog: CatalogPage,
}

/// Home page for `admin` principals.
#[derive(Debug, Serialize)]
pub struct AdminView {
    /// The caller's username.
    pub username: String,
    /// The requested catalog page.
    #[serde(flatten)]
    pub catalog: CatalogPage,
    /// First page of the account roster.
    pub accounts: Vec<AccountSummary>,
}

/// A detail page, optionally annotated with a purchase outcome.
#[derive(Debug, Serialize)]
pub struct DetailView {
    /// The entry with the caller's purchased flag. Absent only when a
    /// purchase committed but the entry could not be re-read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<CatalogDetail>,
    /// The purchase just made, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<PurchaseRecord>,
    /// Why the purchase was refused, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /`.
pub async fn root(_user: AuthUser) -> Redirect {
    Redirect::to("/home/0")
}

/// `GET /home/:page` with optional repeated facet parameters.
///
/// Facet ids are validated before the store is touched.
pub async fn home(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(page): Path<u32>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<HomeView>, ApiError> {
    let filters =
        FacetSelection::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .compile()?;

    let mut session = state.session().await?;
    let catalog = catalog::browse(session.as_mut(), &filters, page).await;

    let view = if principal.is_admin() {
        HomeView::Admin(AdminView {
            username: principal.subject,
            catalog,
            accounts: roster_page(session.as_mut(), 0).await.accounts,
        })
    } else {
        HomeView::User(UserView {
            username: principal.subject,
            catalog,
        })
    };

    Ok(Json(view))
}

/// `GET /games/:id`.
pub async fn game_detail(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(game_id): Path<GameId>,
) -> Result<Json<DetailView>, ApiError> {
    let mut session = state.session().await?;
    let game = catalog::detail(session.as_mut(), game_id, &principal).await?;

    Ok(Json(DetailView {
        game: Some(game),
        purchase: None,
        error: None,
    }))
}

/// `GET /library/:page`.
pub async fn library(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(page): Path<u32>,
) -> Result<Json<LibraryPage>, ApiError> {
    let mut session = state.session().await?;
    Ok(Json(catalog::library(session.as_mut(), &principal, page).await))
}
