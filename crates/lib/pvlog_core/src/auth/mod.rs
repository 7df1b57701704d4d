//! Authentication and session resolution.
//!
//! - [`gateway`]: Keycloak HTTP calls (password/refresh grants, JWKS) and
//!   bearer-token verification.
//! - [`keys`]: signing-key cache owned by the gateway.
//! - [`dev`]: fixed development accounts and the self-issued mock token.
//! - [`session`]: turns credentials or tokens into a [`SessionEnvelope`].
//!
//! [`SessionEnvelope`]: crate::models::auth::SessionEnvelope

pub mod config;
pub mod dev;
pub mod gateway;
pub mod keys;
pub mod session;

use thiserror::Error;

use crate::users::StoreError;

pub use config::KeycloakConfig;
pub use gateway::IdentityGateway;
pub use session::{AuthMode, SessionResolver};

/// Errors raised while talking to the identity provider or verifying its tokens.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Identity provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token signature invalid")]
    TokenSignatureInvalid,

    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// The token endpoint answered with a non-success status.
    #[error("Grant rejected ({status}): {}", .description.as_deref().unwrap_or("no description"))]
    GrantRejected {
        status: u16,
        description: Option<String>,
    },
}

/// Errors surfaced by the session resolver.
///
/// Provider-specific failures are collapsed into these four kinds; the
/// message keeps the specific reason.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("User store error: {0}")]
    Store(#[from] StoreError),
}
