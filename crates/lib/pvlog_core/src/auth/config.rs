//! Keycloak connection settings.

use std::fmt;
use std::time::Duration;

use url::Url;

/// Default bound on every call to the identity provider.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and as whom to reach the Keycloak realm.
#[derive(Clone)]
pub struct KeycloakConfig {
    /// Server root, e.g. `http://localhost:8080`.
    pub base_url: Url,
    pub realm: String,
    pub client_id: String,
    /// Only sent when the client is confidential.
    pub client_secret: Option<String>,
    /// Timeout applied to token, refresh and certs requests.
    pub timeout: Duration,
}

impl KeycloakConfig {
    /// Settings for a public client with the default timeout.
    pub fn new(base_url: Url, realm: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url,
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// `{base}/realms/{realm}/protocol/openid-connect/token`
    pub fn token_url(&self) -> String {
        self.openid_connect_url("token")
    }

    /// `{base}/realms/{realm}/protocol/openid-connect/certs`
    pub fn certs_url(&self) -> String {
        self.openid_connect_url("certs")
    }

    fn openid_connect_url(&self, leaf: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{leaf}",
            self.base_url.as_str().trim_end_matches('/'),
            self.realm
        )
    }
}

impl fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("base_url", &self.base_url.as_str())
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
