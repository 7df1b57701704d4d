//! Request and response bodies.

use pvlog_core::models::auth::{IdentityClaims, LocalUser, SessionEnvelope};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code, e.g. `unauthorized`.
    pub code: String,
}

/// Login body. Both fields are checked by the handler so that a missing
/// field yields a 400 rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Local user joined with the identity claims, as the frontend reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub keycloak_id: String,
    /// Same value as `id`; older clients read this one.
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub rol: String,
    pub keycloak_roles: Vec<String>,
}

impl SessionUser {
    pub fn new(user: &LocalUser, claims: &IdentityClaims) -> Self {
        Self {
            id: user.id,
            keycloak_id: claims.sub.clone(),
            user_id: user.id,
            email: claims.contact_email().to_string(),
            name: claims.display_name().to_string(),
            rol: user.role.clone(),
            keycloak_roles: claims.roles(),
        }
    }
}

/// Body of login, refresh and profile responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub user: SessionUser,
    pub keycloak_user: IdentityClaims,
}

impl SessionResponse {
    pub fn from_envelope(envelope: SessionEnvelope, message: Option<&str>) -> Self {
        let user = SessionUser::new(&envelope.user, &envelope.claims);
        let (access_token, refresh_token, expires_in) = match envelope.tokens {
            Some(t) => (Some(t.access_token), t.refresh_token, Some(t.expires_in)),
            None => (None, None, None),
        };
        Self {
            message: message.map(str::to_string),
            success: true,
            access_token,
            refresh_token,
            expires_in,
            user,
            keycloak_user: envelope.claims,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// `{ "ok": true }`, returned by health, update and delete routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pvlog_core::models::auth::IssuedTokens;

    use super::*;

    fn envelope(tokens: Option<IssuedTokens>) -> SessionEnvelope {
        let claims: IdentityClaims = serde_json::from_value(serde_json::json!({
            "sub": "kc-1",
            "preferred_username": "eva",
            "email": "eva@osmos.es",
            "realm_access": { "roles": ["user", "admin"] },
            "azp": "fotovoltaica-client"
        }))
        .unwrap();
        SessionEnvelope {
            tokens,
            user: LocalUser {
                id: 12,
                subject: "kc-1".into(),
                email: "eva@osmos.es".into(),
                role: "user".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            claims,
        }
    }

    #[test]
    fn session_user_uses_frontend_field_names() {
        let resp = SessionResponse::from_envelope(envelope(None), None);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["keycloakId"], "kc-1");
        assert_eq!(json["user"]["userId"], 12);
        assert_eq!(json["user"]["name"], "eva");
        assert_eq!(json["user"]["rol"], "user");
        assert_eq!(json["user"]["keycloakRoles"][1], "admin");
        assert_eq!(json["keycloak_user"]["azp"], "fotovoltaica-client");
        assert!(json.get("access_token").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn token_fields_are_flattened_into_the_response() {
        let tokens = IssuedTokens {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expires_in: 300,
        };
        let resp = SessionResponse::from_envelope(envelope(Some(tokens)), Some("ok"));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["expires_in"], 300);
        assert_eq!(json["message"], "ok");
    }
}
