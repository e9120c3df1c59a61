//! Account self-service handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Form;
use serde::Deserialize;

use crate::auth::{logout_response, AuthUser};
use crate::error::ApiError;
use crate::mutations;
use crate::state::AppState;

/// Password change form.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    /// The replacement password.
    #[serde(default)]
    pub new_password: String,
}

/// `POST /account/password`.
///
/// On success the session is ended and the caller must log in again with
/// the new password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Form(form): Form<PasswordForm>,
) -> Result<Response, ApiError> {
    let mut session = state.session().await?;
    mutations::change_password(session.as_mut(), &state.hasher, &principal, &form.new_password)
        .await?;

    Ok(logout_response())
}
