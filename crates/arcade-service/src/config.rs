//! Service configuration.

/// Signing key used when `SESSION_SECRET` is unset. Only suitable for local
/// development.
pub const DEV_SESSION_SECRET: &str = "arcade-development-secret";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8000").
    pub listen_addr: String,

    /// PostgreSQL connection string. `memory` or unset selects the
    /// in-process store.
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections (default: 10).
    pub database_max_connections: u32,

    /// Session token signing key.
    pub session_secret: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            tracing::warn!("SESSION_SECRET not set - using the development signing key");
            DEV_SESSION_SECRET.into()
        });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            session_secret,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            secure_cookies: std::env::var("SECURE_COOKIES")
                .is_ok_and(|s| matches!(s.as_str(), "1" | "true" | "yes")),
        }
    }

    /// Whether the in-process store was requested.
    #[must_use]
    pub fn uses_memory_store(&self) -> bool {
        self.database_url
            .as_deref()
            .map_or(true, |url| url.eq_ignore_ascii_case("memory"))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".into(),
            database_url: None,
            database_max_connections: 10,
            session_secret: DEV_SESSION_SECRET.into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
            secure_cookies: false,
        }
    }
}
