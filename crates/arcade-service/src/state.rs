//! Application state.

use std::sync::Arc;

use arcade_store::{Store, StoreSession};

use crate::config::ServiceConfig;
use crate::credentials::CredentialHasher;
use crate::error::ApiError;
use crate::token::SessionCodec;

/// Application state shared across handlers.
///
/// Nothing here is mutated after startup. Each request acquires its own
/// store session through [`AppState::session`].
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Session token codec, keyed once from configuration.
    pub codec: Arc<SessionCodec>,

    /// Password hasher.
    pub hasher: Arc<CredentialHasher>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let codec = Arc::new(SessionCodec::new(config.session_secret.as_bytes()));

        Self {
            store,
            codec,
            hasher: Arc::new(CredentialHasher::default()),
            config,
        }
    }

    /// Replace the password hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Acquire a store session for one request.
    ///
    /// The session is released when the returned box is dropped.
    pub async fn session(&self) -> Result<Box<dyn StoreSession>, ApiError> {
        self.store.session().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to acquire store session");
            ApiError::Internal(e.to_string())
        })
    }
}
