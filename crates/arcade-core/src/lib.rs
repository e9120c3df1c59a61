//! Core types and rules for the arcade catalog service.
//!
//! This crate holds everything that does not touch the network or the store:
//!
//! - **Identifiers**: `AccountId`, `GameId`, `PurchaseId`, `FacetId`
//! - **Identity**: `Principal`, `Role`
//! - **Catalog**: `CatalogEntry`, `CatalogDetail`, `Platform`
//! - **Facets**: `FacetSelection`, `CompiledFilters`, `FacetVocabulary`
//! - **Accounts**: `Account`, `AccountSummary`, `PurchaseRecord`, `OwnedGame`
//! - **Paging**: `PageWindow`, `PageNav`
//!
//! # Money
//!
//! Prices and balances are stored as `i64` cents, never as floats.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod catalog;
pub mod error;
pub mod facets;
pub mod ids;
pub mod paging;
pub mod principal;

pub use account::{Account, AccountSummary, Credential, OwnedGame, PurchaseRecord};
pub use catalog::{split_list, CatalogDetail, CatalogEntry, GameAttributes, Platform};
pub use error::{ArcadeError, Result};
pub use facets::{
    CompiledFilters, Facet, FacetGroupView, FacetKind, FacetOption, FacetSelection,
    FacetVocabulary,
};
pub use ids::{AccountId, FacetId, GameId, IdError, PurchaseId};
pub use paging::{PageNav, PageWindow, ADMIN_PAGE_SIZE, CATALOG_PAGE_SIZE};
pub use principal::{Principal, Role};
