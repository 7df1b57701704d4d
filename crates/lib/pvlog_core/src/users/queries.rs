//! PostgreSQL user store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UserStore};
use crate::models::auth::LocalUser;

const USER_COLUMNS: &str = "id, subject, email, role, created_at, updated_at";

/// User store over the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<LocalUser>, StoreError> {
        let row = sqlx::query_as::<_, LocalUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE subject = $1"
        ))
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(
        &self,
        subject: &str,
        email: &str,
        role: &str,
    ) -> Result<LocalUser, StoreError> {
        sqlx::query_as::<_, LocalUser>(&format!(
            "INSERT INTO users (subject, email, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(subject)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateSubject(subject.to_string())
            }
            other => StoreError::DbError(other),
        })
    }

    async fn update_email(&self, subject: &str, email: &str) -> Result<LocalUser, StoreError> {
        sqlx::query_as::<_, LocalUser>(&format!(
            "UPDATE users SET email = $2, updated_at = now() \
             WHERE subject = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(subject)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(subject.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::IdentityClaims;
    use crate::users::resolve_or_create;

    // Run against PostgreSQL via `sqlx::test` (scratch database per test).

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_subject_insert_is_reported(pool: PgPool) {
        let store = PgUserStore::new(pool);
        store.insert("kc-1", "a@osmos.es", "user").await.unwrap();

        let err = store
            .insert("kc-1", "other@osmos.es", "user")
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::DuplicateSubject(ref s) if s == "kc-1"),
            "got {err:?}"
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_email_for_unknown_subject_is_not_found(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let err = store.update_email("ghost", "g@osmos.es").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn resolve_or_create_provisions_once_and_syncs_email(pool: PgPool) {
        let store = PgUserStore::new(pool.clone());
        let claims = |email: &str| -> IdentityClaims {
            serde_json::from_value(serde_json::json!({ "sub": "kc-9", "email": email })).unwrap()
        };

        let first = resolve_or_create(&store, &claims("old@osmos.es")).await.unwrap();
        let second = resolve_or_create(&store, &claims("new@osmos.es")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "new@osmos.es");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
