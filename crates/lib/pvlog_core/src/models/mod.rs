//! Domain models.

pub mod auth;
pub mod logistics;
