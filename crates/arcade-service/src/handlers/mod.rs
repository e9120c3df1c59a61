//! HTTP handlers.

pub mod account;
pub mod admin;
pub mod catalog;
pub mod health;
pub mod purchases;
pub mod session;
