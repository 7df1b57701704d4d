//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API response shapes
//! (which keep the field names the existing frontend reads).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role stored on a freshly provisioned local user.
pub const DEFAULT_ROLE: &str = "user";

/// Claims asserted by an identity token, either verified from Keycloak or
/// synthesized for a development account.
///
/// Only the claims this service reads are typed; everything else is kept in
/// `extra` so the full claim set can be echoed back to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the stable external user identifier.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Keycloak `realm_access` claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl IdentityClaims {
    /// Realm roles granted by the provider. Empty when the claim is absent.
    pub fn roles(&self) -> Vec<String> {
        self.realm_access
            .as_ref()
            .map(|r| r.roles.clone())
            .unwrap_or_default()
    }

    /// Email to store locally: `email`, then `preferred_username`, then `sub`.
    pub fn contact_email(&self) -> &str {
        self.email
            .as_deref()
            .or(self.preferred_username.as_deref())
            .unwrap_or(&self.sub)
    }

    /// Human-readable name: `name`, then `preferred_username`, then the contact email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.preferred_username.as_deref())
            .unwrap_or_else(|| self.contact_email())
    }
}

/// Local user record, one per external subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocalUser {
    pub id: i64,
    /// External subject identifier (immutable after creation).
    pub subject: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Token triple handed back to the client after a login or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Outcome of a successful login, refresh or profile lookup.
#[derive(Debug, Clone)]
pub struct SessionEnvelope {
    /// `None` on profile lookups, which reuse the caller's token.
    pub tokens: Option<IssuedTokens>,
    pub user: LocalUser,
    pub claims: IdentityClaims,
}
