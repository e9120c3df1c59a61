//! Admin handlers.
//!
//! Every handler checks the caller's token role before reading the form or
//! touching the store.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use arcade_core::{AccountSummary, PageNav, PageWindow, Role, ADMIN_PAGE_SIZE};
use arcade_store::StoreSession;

use crate::auth::{logout_response, AuthUser};
use crate::error::ApiError;
use crate::mutations;
use crate::state::AppState;

/// One page of the account roster. Carries no credential material.
#[derive(Debug, Serialize)]
pub struct RosterPage {
    /// Accounts ordered by id.
    pub accounts: Vec<AccountSummary>,
    /// Neighbouring page numbers.
    #[serde(flatten)]
    pub nav: PageNav,
}

/// Role change form. The role is the target's new role.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    /// Account to change.
    #[serde(default)]
    pub username: String,
    /// `user` or `admin`.
    #[serde(default)]
    pub role: String,
}

/// Account deletion form.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    /// Account to delete.
    #[serde(default)]
    pub username: String,
}

/// Outcome of an admin mutation.
#[derive(Debug, Serialize)]
pub struct AccountAction {
    /// The account acted on.
    pub username: String,
    /// The role now held, for role changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Whether the account was deleted.
    pub deleted: bool,
}

/// Load a roster page. A failed read renders as an empty page.
pub(crate) async fn roster_page(session: &mut dyn StoreSession, page: u32) -> RosterPage {
    let window = PageWindow::new(page, ADMIN_PAGE_SIZE);
    let accounts: Vec<AccountSummary> = match session.list_accounts(window).await {
        Ok(accounts) => accounts.iter().map(AccountSummary::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, page, "Rendering empty roster page");
            Vec::new()
        }
    };

    RosterPage {
        nav: window.nav(accounts.len()),
        accounts,
    }
}

/// `GET /admin/users/:page`.
pub async fn roster(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(page): Path<u32>,
) -> Result<Json<RosterPage>, ApiError> {
    principal.require_role(Role::Admin)?;

    let mut session = state.session().await?;
    Ok(Json(roster_page(session.as_mut(), page).await))
}

/// `POST /admin/role`.
///
/// Demoting one's own account ends the caller's session.
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Form(form): Form<RoleForm>,
) -> Result<Response, ApiError> {
    principal.require_role(Role::Admin)?;

    let role: Role = form
        .role
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown role: {:?}", form.role)))?;

    let mut session = state.session().await?;
    let own_account =
        mutations::change_role(session.as_mut(), &principal, &form.username, role).await?;

    if own_account {
        return Ok(logout_response());
    }

    Ok(Json(AccountAction {
        username: form.username,
        role: Some(role),
        deleted: false,
    })
    .into_response())
}

/// `POST /admin/delete`.
///
/// Deleting one's own account ends the caller's session.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Form(form): Form<DeleteForm>,
) -> Result<Response, ApiError> {
    principal.require_role(Role::Admin)?;

    let mut session = state.session().await?;
    let own_account = mutations::delete_account(session.as_mut(), &principal, &form.username).await?;

    if own_account {
        return Ok(logout_response());
    }

    Ok(Json(AccountAction {
        username: form.username,
        role: None,
        deleted: true,
    })
    .into_response())
}
