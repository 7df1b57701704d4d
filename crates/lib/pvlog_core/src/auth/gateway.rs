//! Identity provider gateway.
//!
//! Talks to one Keycloak realm: password and refresh grants against the
//! token endpoint, and JWKS retrieval from the certs endpoint. Verifies
//! bearer tokens against the cached key set.
//!
//! Issuer and audience are not checked; any token signed by a realm key and
//! not yet expired is accepted.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::GatewayError;
use super::config::KeycloakConfig;
use super::keys::{RawKeySet, SigningKeyCache};
use crate::models::auth::{IdentityClaims, IssuedTokens};

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
}

/// OAuth2 error body returned with a non-success status.
#[derive(Debug, Default, Deserialize)]
struct OAuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Gateway to a Keycloak realm. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct IdentityGateway {
    http: Client,
    config: KeycloakConfig,
    keys: SigningKeyCache,
}

impl IdentityGateway {
    /// Build a gateway with its own HTTP client bounded by `config.timeout`.
    pub fn new(config: KeycloakConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("HTTP client setup: {e}")))?;
        Ok(Self {
            http,
            config,
            keys: SigningKeyCache::new(),
        })
    }

    /// Override the signing-key staleness threshold.
    pub fn with_key_ttl(mut self, ttl: Duration) -> Self {
        self.keys = SigningKeyCache::with_ttl(ttl);
        self
    }

    /// Realm settings this gateway talks to.
    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Signing keys
    // -------------------------------------------------------------------------

    /// Return the realm's signing keys, fetching them when the cache is stale.
    ///
    /// A failed fetch leaves the previous cache entry in place; nothing is
    /// retried here.
    pub async fn signing_keys(&self) -> Result<Arc<JwkSet>, GatewayError> {
        if let Some(keys) = self.keys.fresh().await {
            return Ok(keys);
        }

        let url = self.config.certs_url();
        debug!(%url, "fetching realm signing keys");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| upstream("JWKS fetch", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, "JWKS fetch rejected");
            return Err(GatewayError::UpstreamUnavailable(format!(
                "JWKS fetch HTTP {status}"
            )));
        }

        let raw = resp
            .json::<RawKeySet>()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("JWKS parse error: {e}")))?;

        let keys = self.keys.store(raw.into_signing_keys()).await;
        info!(count = keys.keys.len(), "realm signing keys refreshed");
        Ok(keys)
    }

    // -------------------------------------------------------------------------
    // Token verification
    // -------------------------------------------------------------------------

    /// Verify a bearer token's signature and expiry, returning its claims.
    pub async fn verify_token(&self, token: &str) -> Result<IdentityClaims, GatewayError> {
        let header = decode_header(token)
            .map_err(|e| GatewayError::TokenInvalid(format!("malformed token: {e}")))?;

        let keys = self.signing_keys().await?;
        let jwk = select_key(&keys, header.kid.as_deref())?;

        if !algorithm_matches_key(header.alg, jwk) {
            return Err(GatewayError::TokenInvalid(format!(
                "algorithm {:?} does not match key type",
                header.alg
            )));
        }

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| GatewayError::TokenInvalid(format!("unusable signing key: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;

        let data = decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => GatewayError::TokenExpired,
                ErrorKind::InvalidSignature => GatewayError::TokenSignatureInvalid,
                _ => GatewayError::TokenInvalid(e.to_string()),
            }
        })?;

        debug!(
            subject = %data.claims.sub,
            username = data.claims.preferred_username.as_deref().unwrap_or("-"),
            "token verified"
        );
        Ok(data.claims)
    }

    // -------------------------------------------------------------------------
    // Grants
    // -------------------------------------------------------------------------

    /// Resource-owner-password grant.
    pub async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedTokens, GatewayError> {
        debug!(username, client_id = %self.config.client_id, "requesting password grant");
        let mut params = vec![
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        self.token_request(&params, "password grant").await
    }

    /// Refresh-token grant.
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<IssuedTokens, GatewayError> {
        debug!(client_id = %self.config.client_id, "requesting refresh grant");
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }
        self.token_request(&params, "refresh grant").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> Result<IssuedTokens, GatewayError> {
        let resp = self
            .http
            .post(self.config.token_url())
            .form(params)
            .send()
            .await
            .map_err(|e| upstream(what, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<OAuthErrorBody>().await.unwrap_or_default();
            warn!(
                %status,
                error = body.error.as_deref().unwrap_or("-"),
                "{what} rejected"
            );
            return Err(GatewayError::GrantRejected {
                status: status.as_u16(),
                description: body.error_description,
            });
        }

        let tokens = resp
            .json::<TokenEndpointResponse>()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("{what} parse error: {e}")))?;

        Ok(IssuedTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        })
    }
}

/// Map a transport failure (connect, timeout, body) to `UpstreamUnavailable`.
fn upstream(what: &str, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::UpstreamUnavailable(format!("{what} timed out"))
    } else {
        GatewayError::UpstreamUnavailable(format!("{what} failed: {e}"))
    }
}

/// Pick the verification key for a token.
///
/// With a `kid` the key must be in the set. Without one, the set must hold
/// exactly one key.
fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk, GatewayError> {
    match kid {
        Some(kid) => keys
            .find(kid)
            .ok_or_else(|| GatewayError::TokenInvalid(format!("unknown signing key '{kid}'"))),
        None => match keys.keys.as_slice() {
            [only] => Ok(only),
            _ => Err(GatewayError::TokenInvalid(
                "token has no key id and the realm has several keys".into(),
            )),
        },
    }
}

fn algorithm_matches_key(alg: Algorithm, jwk: &Jwk) -> bool {
    use Algorithm::*;
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(alg, RS256 | RS384 | RS512 | PS256 | PS384 | PS512),
        AlgorithmParameters::EllipticCurve(_) => matches!(alg, ES256 | ES384),
        AlgorithmParameters::OctetKey(_) => matches!(alg, HS256 | HS384 | HS512),
        AlgorithmParameters::OctetKeyPair(_) => matches!(alg, EdDSA),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KID: &str = "pvlog-test-key";
    const CERTS_PATH: &str = "/realms/master/protocol/openid-connect/certs";
    const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

    fn jwks() -> serde_json::Value {
        serde_json::from_str(include_str!("../../testdata/jwks.json")).unwrap()
    }

    fn sign_with(pem: &str, kid: Option<&str>, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": "kc-subject-1",
            "email": "ana@osmos.es",
            "name": "Ana",
            "preferred_username": "ana",
            "realm_access": { "roles": ["user"] },
            "aud": "account",
            "iss": "http://elsewhere/realms/other",
            "iat": now,
            "exp": now + exp_offset_secs,
        });
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn valid_token() -> String {
        sign_with(include_str!("../../testdata/signing_key.pem"), Some(KID), 3600)
    }

    fn gateway_for(server: &MockServer) -> IdentityGateway {
        let config = KeycloakConfig::new(
            Url::parse(&server.uri()).unwrap(),
            "master",
            "fotovoltaica-client",
        );
        IdentityGateway::new(config).unwrap()
    }

    async fn mount_certs(server: &MockServer, expected_fetches: u64) {
        Mock::given(method("GET"))
            .and(path(CERTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
            .expect(expected_fetches)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn verify_accepts_realm_signed_token_regardless_of_issuer_and_audience() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        let claims = gateway.verify_token(&valid_token()).await.unwrap();
        assert_eq!(claims.sub, "kc-subject-1");
        assert_eq!(claims.email.as_deref(), Some("ana@osmos.es"));
        assert_eq!(claims.roles(), vec!["user"]);
    }

    #[tokio::test]
    async fn two_verifications_within_window_fetch_keys_once() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        gateway.verify_token(&valid_token()).await.unwrap();
        gateway.verify_token(&valid_token()).await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn verification_after_window_refetches_once() {
        let server = MockServer::start().await;
        mount_certs(&server, 2).await;
        let gateway = gateway_for(&server).with_key_ttl(Duration::from_millis(50));

        gateway.verify_token(&valid_token()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        gateway.verify_token(&valid_token()).await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        let token = sign_with(include_str!("../../testdata/signing_key.pem"), Some(KID), -3600);
        let err = gateway.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenExpired), "got {err:?}");
    }

    #[tokio::test]
    async fn foreign_signature_is_reported_as_signature_invalid() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        let token = sign_with(include_str!("../../testdata/foreign_key.pem"), Some(KID), 3600);
        let err = gateway.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenSignatureInvalid), "got {err:?}");
    }

    #[tokio::test]
    async fn garbage_and_unknown_kid_are_invalid() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        let err = gateway.verify_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenInvalid(_)), "got {err:?}");

        let token = sign_with(include_str!("../../testdata/signing_key.pem"), Some("rotated"), 3600);
        let err = gateway.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenInvalid(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn token_without_kid_uses_the_only_signing_key() {
        let server = MockServer::start().await;
        mount_certs(&server, 1).await;
        let gateway = gateway_for(&server);

        let token = sign_with(include_str!("../../testdata/signing_key.pem"), None, 3600);
        let claims = gateway.verify_token(&token).await.unwrap();
        assert_eq!(claims.sub, "kc-subject-1");
    }

    #[tokio::test]
    async fn failed_key_fetch_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CERTS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let gateway = gateway_for(&server);

        let err = gateway.signing_keys().await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn failed_refetch_keeps_previous_keys_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CERTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(CERTS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let gateway = gateway_for(&server).with_key_ttl(Duration::ZERO);

        gateway.signing_keys().await.unwrap();
        assert!(gateway.signing_keys().await.is_err());
        // Entry is stale but still present; a longer TTL would serve it.
        assert!(gateway.keys.entry.read().await.is_some());
    }

    #[tokio::test]
    async fn password_grant_posts_form_and_parses_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("client_id=fotovoltaica-client"))
            .and(body_string_contains("username=ana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 300,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let gateway = gateway_for(&server);

        let tokens = gateway.password_grant("ana", "pw").await.unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
        assert_eq!(tokens.expires_in, 300);
    }

    #[tokio::test]
    async fn rejected_grant_carries_error_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;
        let gateway = gateway_for(&server);

        match gateway.password_grant("ana", "bad").await.unwrap_err() {
            GatewayError::GrantRejected {
                status,
                description,
            } => {
                assert_eq!(status, 401);
                assert_eq!(description.as_deref(), Some("Invalid user credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_grant_sends_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-2",
                "refresh_token": "rt-2",
                "expires_in": 300
            })))
            .expect(1)
            .mount(&server)
            .await;
        let gateway = gateway_for(&server);

        let tokens = gateway.refresh_grant("rt-1").await.unwrap();
        assert_eq!(tokens.access_token, "at-2");
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        let mut config = KeycloakConfig::new(Url::parse(&server.uri()).unwrap(), "master", "c");
        config.timeout = Duration::from_millis(50);
        let gateway = IdentityGateway::new(config).unwrap();

        let err = gateway.password_grant("ana", "pw").await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_provider_is_upstream_unavailable() {
        let config = KeycloakConfig::new(Url::parse("http://127.0.0.1:9").unwrap(), "master", "c");
        let gateway = IdentityGateway::new(config).unwrap();

        let err = gateway.signing_keys().await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)), "got {err:?}");
    }
}
