//! Purchase handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use arcade_core::{ArcadeError, GameId};

use crate::auth::AuthUser;
use crate::catalog;
use crate::error::ApiError;
use crate::handlers::catalog::DetailView;
use crate::mutations;
use crate::state::AppState;

/// `POST /games/:id/purchase`.
///
/// A refused purchase re-renders the detail page with the reason attached
/// (402). The session stays valid. A committed purchase is always reported
/// as 200 with its record, even when the detail page cannot be re-read.
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(game_id): Path<GameId>,
) -> Result<Response, ApiError> {
    let mut session = state.session().await?;

    match mutations::purchase(session.as_mut(), &principal, game_id).await {
        Ok(record) => {
            // Committed: a failed re-render must not turn this into an error.
            let game = match catalog::detail(session.as_mut(), game_id, &principal).await {
                Ok(game) => Some(game),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        game_id = %game_id,
                        "Purchase recorded but detail page could not be rendered"
                    );
                    None
                }
            };
            Ok(Json(DetailView {
                game,
                purchase: Some(record),
                error: None,
            })
            .into_response())
        }
        Err(ArcadeError::Purchase(reason)) => {
            match catalog::detail(session.as_mut(), game_id, &principal).await {
                Ok(game) => Ok((
                    StatusCode::PAYMENT_REQUIRED,
                    Json(DetailView {
                        game: Some(game),
                        purchase: None,
                        error: Some(reason),
                    }),
                )
                    .into_response()),
                // Nothing to re-render for an unknown entry.
                Err(ArcadeError::NotFound { .. }) => Err(ApiError::PurchaseFailed(reason)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        game_id = %game_id,
                        "Detail page unavailable after refused purchase"
                    );
                    Err(ApiError::PurchaseFailed(reason))
                }
            }
        }
        Err(e) => Err(e.into()),
    }
}
