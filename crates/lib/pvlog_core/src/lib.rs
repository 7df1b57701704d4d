//! # pvlog_core
//!
//! Core domain logic for the PV logistics backend: Keycloak token
//! verification, session resolution, local user provisioning and the
//! logistics tables.

pub mod auth;
pub mod logistics;
pub mod migrate;
pub mod models;
pub mod users;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
