//! In-memory signing-key cache with TTL-based staleness.
//!
//! Holds the last JWKS fetched from Keycloak. Refreshes are not serialized:
//! concurrent callers that find the entry stale may each fetch, and the last
//! `store` wins. Key sets are immutable once fetched, so that is harmless.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Default staleness threshold: 5 minutes.
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(300);

/// A fetched key set with its fetch time.
#[derive(Debug, Clone)]
pub(super) struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Signing-key cache owned by one [`IdentityGateway`](super::IdentityGateway).
#[derive(Debug)]
pub struct SigningKeyCache {
    pub(super) entry: RwLock<Option<CachedKeySet>>,
    ttl: Duration,
}

impl SigningKeyCache {
    /// Create an empty cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_KEY_SET_TTL)
    }

    /// Create an empty cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// The cached key set, if one was stored within the TTL.
    pub async fn fresh(&self) -> Option<Arc<JwkSet>> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.keys))
    }

    /// Replace the cached key set and stamp it with the current time.
    pub async fn store(&self, keys: JwkSet) -> Arc<JwkSet> {
        let keys = Arc::new(keys);
        *self.entry.write().await = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        keys
    }
}

impl Default for SigningKeyCache {
    fn default() -> Self {
        Self::new()
    }
}

/// JWKS document as served by Keycloak, before per-key parsing.
#[derive(Debug, Deserialize)]
pub(crate) struct RawKeySet {
    #[serde(default)]
    keys: Vec<serde_json::Value>,
}

impl RawKeySet {
    /// Keep the signature keys that parse as JWKs.
    ///
    /// Keycloak publishes encryption keys (`use: enc`) alongside signing keys,
    /// and a single unparseable entry must not poison the whole set.
    pub(crate) fn into_signing_keys(self) -> JwkSet {
        let keys = self
            .keys
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Jwk>(value) {
                Ok(jwk) => Some(jwk),
                Err(e) => {
                    debug!("skipping unparseable JWK: {e}");
                    None
                }
            })
            .filter(|jwk| !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)))
            .collect();
        JwkSet { keys }
    }
}
