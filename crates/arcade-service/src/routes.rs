//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, admin, catalog, health, purchases, session};
use crate::state::AppState;

/// Maximum concurrent requests on session-protected routes. Each one holds
/// a store connection while it runs.
const APP_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET|POST /login` - Login form / start a session
/// - `GET|POST /register` - Registration form / create an account
/// - `GET /logout` - End the session
///
/// ## Authenticated (session cookie or bearer header)
/// - `GET /` - Redirect to the first catalog page
/// - `GET /home/:page` - Catalog page with facet filters
/// - `GET /games/:id` - Entry detail
/// - `POST /games/:id/purchase` - Buy an entry
/// - `GET /library/:page` - Purchased entries
/// - `POST /account/password` - Change password (ends the session)
///
/// ## Admin
/// - `GET /admin/users/:page` - Account roster
/// - `POST /admin/role` - Change an account's role
/// - `POST /admin/delete` - Delete an account
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let app_routes = Router::new()
        .route("/", get(catalog::root))
        .route("/home/:page", get(catalog::home))
        .route("/games/:id", get(catalog::game_detail))
        .route("/games/:id/purchase", post(purchases::purchase))
        .route("/library/:page", get(catalog::library))
        .route("/account/password", post(account::change_password))
        .route("/admin/users/:page", get(admin::roster))
        .route("/admin/role", post(admin::change_role))
        .route("/admin/delete", post(admin::delete_account))
        .layer(ConcurrencyLimitLayer::new(APP_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .route("/login", get(session::login_form).post(session::login))
        .route("/register", get(session::register_form).post(session::register))
        .route("/logout", get(session::logout))
        .merge(app_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
