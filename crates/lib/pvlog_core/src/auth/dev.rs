//! Development authentication: fixed demonstration accounts and the
//! self-issued mock token.
//!
//! A mock access token is `dev-token-` followed by standard base64 of a JSON
//! payload `{sub, email, exp, iat}`. The refresh token carries the same
//! payload behind `dev-refresh-`. Mock tokens are never signed; they are only
//! honoured while the resolver runs in development mode.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::auth::{IdentityClaims, IssuedTokens, RealmAccess};

/// Prefix that marks a self-issued access token.
pub const MOCK_ACCESS_PREFIX: &str = "dev-token-";

/// Prefix that marks a self-issued refresh token.
pub const MOCK_REFRESH_PREFIX: &str = "dev-refresh-";

/// Mock token lifetime: 1 hour.
pub const MOCK_TOKEN_LIFETIME_SECS: i64 = 3600;

/// A demonstration account accepted in development mode.
#[derive(Debug, Clone, Copy)]
pub struct DevAccount {
    pub username: &'static str,
    pub password: &'static str,
    pub subject: &'static str,
    pub display_name: &'static str,
    pub roles: &'static [&'static str],
}

/// The fixed allow-list of demonstration accounts.
pub const DEV_ACCOUNTS: &[DevAccount] = &[
    DevAccount {
        username: "agustin.lago@osmos.es",
        password: "Osmos2025",
        subject: "dev-user-123",
        display_name: "Agustín Lago (Dev)",
        roles: &["user", "admin"],
    },
    DevAccount {
        username: "beatriz.rodriguez@osmos.es",
        password: "osmos",
        subject: "dev-user-beatriz",
        display_name: "Beatriz Rodríguez (Dev)",
        roles: &["user"],
    },
];

impl DevAccount {
    /// Look up an account by exact username and password.
    pub fn authenticate(username: &str, password: &str) -> Option<&'static DevAccount> {
        DEV_ACCOUNTS
            .iter()
            .find(|a| a.username == username && a.password == password)
    }

    /// Look up an account by subject.
    pub fn by_subject(subject: &str) -> Option<&'static DevAccount> {
        DEV_ACCOUNTS.iter().find(|a| a.subject == subject)
    }

    /// Claims this account presents, shaped like a Keycloak access token.
    pub fn claims(&self) -> IdentityClaims {
        IdentityClaims {
            sub: self.subject.to_string(),
            email: Some(self.username.to_string()),
            name: Some(self.display_name.to_string()),
            preferred_username: Some(self.username.to_string()),
            realm_access: Some(RealmAccess {
                roles: self.roles.iter().map(|r| r.to_string()).collect(),
            }),
            extra: serde_json::Map::new(),
        }
    }
}

/// Payload embedded in a mock token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockTokenPayload {
    pub sub: String,
    pub email: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Why a mock token could not be read.
#[derive(Debug, thiserror::Error)]
pub enum MockTokenError {
    #[error("mock token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("mock token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockTokenPayload {
    /// Payload for `account`, valid for one hour from `now`.
    pub fn issue(account: &DevAccount, now: DateTime<Utc>) -> Self {
        Self {
            sub: account.subject.to_string(),
            email: account.username.to_string(),
            exp: (now + Duration::seconds(MOCK_TOKEN_LIFETIME_SECS)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Decode the base64 JSON that follows the prefix.
    pub fn decode(encoded: &str) -> Result<Self, MockTokenError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn encode(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Access/refresh pair for this payload.
    pub fn into_tokens(self) -> IssuedTokens {
        let encoded = self.encode();
        IssuedTokens {
            access_token: format!("{MOCK_ACCESS_PREFIX}{encoded}"),
            refresh_token: Some(format!("{MOCK_REFRESH_PREFIX}{encoded}")),
            expires_in: MOCK_TOKEN_LIFETIME_SECS,
        }
    }
}

/// A bearer token as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerToken<'a> {
    /// Self-issued development token; holds the encoded payload without prefix.
    Mock(&'a str),
    /// Token to be verified against the identity provider.
    Provider(&'a str),
}

impl<'a> BearerToken<'a> {
    /// Classify a raw token. Mock tokens are only recognised when
    /// `accept_mock` is set; otherwise everything goes to the provider.
    pub fn classify(raw: &'a str, accept_mock: bool) -> Self {
        match raw.strip_prefix(MOCK_ACCESS_PREFIX) {
            Some(payload) if accept_mock => BearerToken::Mock(payload),
            _ => BearerToken::Provider(raw),
        }
    }
}
