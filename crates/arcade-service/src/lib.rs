//! Arcade HTTP service.
//!
//! This crate provides the authenticated catalog and purchase API:
//!
//! - Session tokens ([`token`]) and the authorization gate ([`auth`])
//! - Facet-filtered catalog browsing and entry detail ([`catalog`])
//! - Purchases, password changes and admin account management
//!   ([`mutations`])
//!
//! # Authentication
//!
//! A session is an HS256 token carried as `Authorization: Bearer <token>`,
//! either in the header or in the `Authorization` cookie set at login.
//! Requests without a valid session are redirected to `/login` with the
//! cookie cleared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Form descriptors are async for the router

pub mod auth;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod mutations;
pub mod routes;
pub mod state;
pub mod token;

pub use config::ServiceConfig;
pub use credentials::CredentialHasher;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use token::SessionCodec;
