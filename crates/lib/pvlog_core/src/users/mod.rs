//! Local user records and the resolve-or-create path.
//!
//! A record is keyed by the identity provider's subject. It is created on
//! the first successful authentication and afterwards only its email is
//! kept in sync with the claims. The role is local and never copied from
//! provider roles.

pub mod memory;
pub mod queries;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::auth::{DEFAULT_ROLE, IdentityClaims, LocalUser};

pub use memory::MemoryUserStore;
pub use queries::PgUserStore;

/// User store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A user already exists for subject {0}")]
    DuplicateSubject(String),

    #[error("No user for subject {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Persistence for local user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the record for an external subject.
    async fn find_by_subject(&self, subject: &str) -> Result<Option<LocalUser>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::DuplicateSubject`] when
    /// the subject already has one.
    async fn insert(&self, subject: &str, email: &str, role: &str)
    -> Result<LocalUser, StoreError>;

    /// Set the email for a subject and bump `updated_at`. Idempotent.
    async fn update_email(&self, subject: &str, email: &str) -> Result<LocalUser, StoreError>;
}

/// Return the local record for `claims.sub`, creating it on first sight.
///
/// When two first logins for the same subject race, the loser's insert hits
/// the unique constraint; it then re-reads the winner's record instead of
/// failing.
pub async fn resolve_or_create(
    store: &dyn UserStore,
    claims: &IdentityClaims,
) -> Result<LocalUser, StoreError> {
    let email = claims.contact_email();

    if let Some(existing) = store.find_by_subject(&claims.sub).await? {
        return sync_email(store, existing, email).await;
    }

    match store.insert(&claims.sub, email, DEFAULT_ROLE).await {
        Ok(user) => {
            info!(subject = %user.subject, id = user.id, "provisioned local user");
            Ok(user)
        }
        Err(StoreError::DuplicateSubject(_)) => {
            debug!(subject = %claims.sub, "lost first-login race, re-reading user");
            let existing = store
                .find_by_subject(&claims.sub)
                .await?
                .ok_or_else(|| StoreError::NotFound(claims.sub.clone()))?;
            sync_email(store, existing, email).await
        }
        Err(e) => Err(e),
    }
}

async fn sync_email(
    store: &dyn UserStore,
    existing: LocalUser,
    email: &str,
) -> Result<LocalUser, StoreError> {
    if existing.email == email {
        return Ok(existing);
    }
    debug!(subject = %existing.subject, "email changed upstream, syncing");
    store.update_email(&existing.subject, email).await
}
