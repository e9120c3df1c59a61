//! Authorization gate.
//!
//! Every protected handler takes an [`AuthUser`]. The extractor looks for a
//! bearer credential in the `Authorization` header and then in the
//! `Authorization` cookie, decodes it with the process-wide
//! [`SessionCodec`](crate::token::SessionCodec), and rejects the request
//! with [`ApiError::Unauthorized`] otherwise. The rejection redirects to the
//! login page and clears the cookie.
//!
//! Role checks use the role from the decoded token only. Request bodies
//! never carry the caller's role.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE, LOCATION, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

use arcade_core::{ArcadeError, Principal, Result};

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::{SessionCodec, SESSION_TTL_MINUTES};

// ============================================================================
// Constants
// ============================================================================

/// Name of the header and the cookie carrying the session.
pub const AUTH_COOKIE: &str = "Authorization";

/// Login entry point unauthenticated requests are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Scheme prefix of the credential.
const BEARER: &str = "Bearer";

// ============================================================================
// Credential extraction
// ============================================================================

/// Parse a `Bearer <token>` credential.
///
/// Accepts the cookie encodings browsers produce: surrounding quotes and a
/// `%20` separator. Anything other than exactly two parts with the `Bearer`
/// scheme is rejected.
fn parse_bearer(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches('"').replace("%20", " ");
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) => Some(token.to_string()),
        _ => None,
    }
}

/// Value of the session cookie, if the request carries one.
fn session_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value)
}

/// Extract the bearer token from the header, falling back to the cookie.
///
/// A present `Authorization` header is authoritative: if it is malformed
/// the request has no session, whatever the cookie holds.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        return value.to_str().ok().and_then(parse_bearer);
    }

    session_cookie_value(headers).and_then(parse_bearer)
}

/// Resolve the principal behind a request.
///
/// # Errors
///
/// Returns `ArcadeError::Unauthorized` if no well-formed bearer credential
/// is present or it does not decode.
pub fn authenticate(
    headers: &HeaderMap,
    codec: &SessionCodec,
    now: DateTime<Utc>,
) -> Result<Principal> {
    let token = bearer_token(headers).ok_or(ArcadeError::Unauthorized)?;

    codec.decode(&token, now).map_err(|e| {
        tracing::debug!(error = %e, "Rejecting session credential");
        ArcadeError::Unauthorized
    })
}

// ============================================================================
// Extractor
// ============================================================================

/// An authenticated principal, decoded fresh for this request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let principal = authenticate(&parts.headers, &state.codec, Utc::now())?;
        Ok(Self(principal))
    }
}

// ============================================================================
// Cookies
// ============================================================================

/// `Set-Cookie` value storing `token` as the session.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = SESSION_TTL_MINUTES * 60;
    let secure = if secure { "; Secure" } else { "" };
    format!("{AUTH_COOKIE}=Bearer%20{token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
}

/// `Set-Cookie` value removing the session.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{AUTH_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Redirect to the login page with the session cleared.
#[must_use]
pub fn logout_response() -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (LOCATION, LOGIN_PATH.to_string()),
            (SET_COOKIE, clear_session_cookie()),
        ],
    )
        .into_response()
}
