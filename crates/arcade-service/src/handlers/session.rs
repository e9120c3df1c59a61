//! Login, registration and logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{logout_response, session_cookie, LOGIN_PATH};
use crate::credentials::authenticate_credentials;
use crate::error::ApiError;
use crate::mutations;
use crate::state::AppState;

/// Where a fresh session lands.
const HOME_PATH: &str = "/home/0";

/// Username/password form.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    /// Account name.
    #[serde(default)]
    pub username: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// Description of a form the client should render.
#[derive(Debug, Serialize)]
pub struct FormDescriptor {
    /// Form name.
    pub form: &'static str,
    /// Where to post it.
    pub action: &'static str,
    /// Field names.
    pub fields: [&'static str; 2],
}

/// `GET /login`.
pub async fn login_form() -> Json<FormDescriptor> {
    Json(FormDescriptor {
        form: "login",
        action: LOGIN_PATH,
        fields: ["username", "password"],
    })
}

/// `POST /login`: verify the credential and start a session.
///
/// Bad credentials send the caller back to the login page with any existing
/// session cleared.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let account = {
        let mut session = state.session().await?;
        authenticate_credentials(session.as_mut(), &state.hasher, &form.username, &form.password)
            .await?
    };

    let token = state
        .codec
        .issue(&account.username, account.role, Some(account.id), Utc::now())?;

    tracing::info!(account_id = %account.id, role = %account.role, "Session started");

    Ok((
        StatusCode::SEE_OTHER,
        [
            (LOCATION, HOME_PATH.to_string()),
            (SET_COOKIE, session_cookie(&token, state.config.secure_cookies)),
        ],
    )
        .into_response())
}

/// `GET /register`.
pub async fn register_form() -> Json<FormDescriptor> {
    Json(FormDescriptor {
        form: "register",
        action: "/register",
        fields: ["username", "password"],
    })
}

/// `POST /register`: create a `user` account, then send the caller to log in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let mut session = state.session().await?;
    mutations::register(session.as_mut(), &state.hasher, &form.username, &form.password).await?;

    Ok((StatusCode::SEE_OTHER, [(LOCATION, LOGIN_PATH)]).into_response())
}

/// `GET /logout`.
pub async fn logout() -> Response {
    logout_response()
}
