//! Session resolution.
//!
//! Turns credentials or a bearer token into a [`SessionEnvelope`]. The mode
//! is fixed when the resolver is built:
//!
//! - [`AuthMode::Provider`]: every login goes through the Keycloak password
//!   grant and every token is verified against the realm keys.
//! - [`AuthMode::Development`]: logins are checked against the fixed
//!   demonstration accounts and answered with self-issued mock tokens. Real
//!   provider tokens are still verified normally.
//!
//! Refresh always uses the provider, in both modes.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::dev::{BearerToken, DevAccount, MockTokenPayload};
use super::{GatewayError, IdentityGateway, SessionError};
use crate::models::auth::{IdentityClaims, IssuedTokens, SessionEnvelope};
use crate::users::{UserStore, resolve_or_create};

/// How credentials are checked. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Delegate to the identity provider.
    Provider,
    /// Accept the fixed demonstration accounts and their mock tokens.
    Development,
}

impl AuthMode {
    /// `Development` when the dev-auth flag is set, `Provider` otherwise.
    pub fn from_dev_flag(dev_auth_enabled: bool) -> Self {
        if dev_auth_enabled {
            AuthMode::Development
        } else {
            AuthMode::Provider
        }
    }

    fn accepts_mock_tokens(self) -> bool {
        self == AuthMode::Development
    }
}

/// Resolves sessions against one identity provider and one user store.
pub struct SessionResolver {
    mode: AuthMode,
    gateway: Arc<IdentityGateway>,
    users: Arc<dyn UserStore>,
}

impl SessionResolver {
    pub fn new(mode: AuthMode, gateway: Arc<IdentityGateway>, users: Arc<dyn UserStore>) -> Self {
        if mode == AuthMode::Development {
            warn!("development authentication enabled: demonstration accounts accepted");
        }
        Self {
            mode,
            gateway,
            users,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Credential flow.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionEnvelope, SessionError> {
        let (tokens, claims) = match self.mode {
            AuthMode::Development => {
                let account = DevAccount::authenticate(username, password).ok_or_else(|| {
                    SessionError::InvalidCredentials("Invalid credentials (development mode)".into())
                })?;
                debug!(username, "development login accepted");
                let tokens = MockTokenPayload::issue(account, Utc::now()).into_tokens();
                (tokens, account.claims())
            }
            AuthMode::Provider => {
                let tokens = self
                    .gateway
                    .password_grant(username, password)
                    .await
                    .map_err(|e| match e {
                        GatewayError::GrantRejected { description, .. } => {
                            SessionError::InvalidCredentials(
                                description.unwrap_or_else(|| "Invalid credentials".into()),
                            )
                        }
                        other => from_gateway(other),
                    })?;
                // Freshly issued, but verified all the same.
                let claims = self
                    .gateway
                    .verify_token(&tokens.access_token)
                    .await
                    .map_err(from_gateway)?;
                (tokens, claims)
            }
        };

        let envelope = self.establish(Some(tokens), claims).await?;
        info!(subject = %envelope.user.subject, user_id = envelope.user.id, "login succeeded");
        Ok(envelope)
    }

    /// Refresh flow. Always delegated to the provider.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionEnvelope, SessionError> {
        let tokens = self
            .gateway
            .refresh_grant(refresh_token)
            .await
            .map_err(|e| match e {
                GatewayError::GrantRejected { .. } => {
                    SessionError::InvalidToken("Invalid refresh token".into())
                }
                other => from_gateway(other),
            })?;

        let claims = self
            .gateway
            .verify_token(&tokens.access_token)
            .await
            .map_err(from_gateway)?;

        self.establish(Some(tokens), claims).await
    }

    /// Token flow: who does this access token belong to?
    pub async fn profile(&self, access_token: &str) -> Result<SessionEnvelope, SessionError> {
        let claims = match BearerToken::classify(access_token, self.mode.accepts_mock_tokens()) {
            BearerToken::Mock(payload) => {
                let payload = MockTokenPayload::decode(payload).map_err(|e| {
                    SessionError::InvalidToken(format!("Malformed development token: {e}"))
                })?;
                DevAccount::by_subject(&payload.sub)
                    .ok_or_else(|| SessionError::InvalidToken("Unknown development token".into()))?
                    .claims()
            }
            BearerToken::Provider(token) => {
                self.gateway.verify_token(token).await.map_err(|e| {
                    SessionError::InvalidToken(format!("Invalid or expired token: {e}"))
                })?
            }
        };

        self.establish(None, claims).await
    }

    async fn establish(
        &self,
        tokens: Option<IssuedTokens>,
        claims: IdentityClaims,
    ) -> Result<SessionEnvelope, SessionError> {
        let user = resolve_or_create(self.users.as_ref(), &claims).await?;
        Ok(SessionEnvelope {
            tokens,
            user,
            claims,
        })
    }
}

/// Collapse gateway failures into the resolver taxonomy.
fn from_gateway(e: GatewayError) -> SessionError {
    match e {
        GatewayError::UpstreamUnavailable(msg) => SessionError::UpstreamUnavailable(msg),
        GatewayError::TokenExpired => SessionError::InvalidToken("Token expired".into()),
        GatewayError::TokenSignatureInvalid => {
            SessionError::InvalidToken("Token signature invalid".into())
        }
        GatewayError::TokenInvalid(msg) => SessionError::InvalidToken(format!("Invalid token: {msg}")),
        other @ GatewayError::GrantRejected { .. } => SessionError::InvalidToken(other.to_string()),
    }
}
