//! Logistics records: trucks, structure deliveries, pallets and panels.
//!
//! Plain CRUD over the tables created by the initial migration. Updates are
//! partial: a field missing from the input keeps its stored value.

pub mod queries;

use thiserror::Error;

pub use queries::*;

/// Logistics errors.
#[derive(Debug, Error)]
pub enum LogisticsError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}
