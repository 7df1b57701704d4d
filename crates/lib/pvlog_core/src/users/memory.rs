//! In-memory user store.
//!
//! Backs the API tests and any run that has no database behind it. The
//! subject map enforces the same uniqueness the `users.subject` constraint
//! does in PostgreSQL.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{StoreError, UserStore};
use crate::models::auth::LocalUser;

/// Process-local user records keyed by subject.
#[derive(Debug)]
pub struct MemoryUserStore {
    users: DashMap<String, LocalUser>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<LocalUser>, StoreError> {
        Ok(self.users.get(subject).map(|u| u.value().clone()))
    }

    async fn insert(
        &self,
        subject: &str,
        email: &str,
        role: &str,
    ) -> Result<LocalUser, StoreError> {
        match self.users.entry(subject.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSubject(subject.to_string())),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = LocalUser {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    subject: subject.to_string(),
                    email: email.to_string(),
                    role: role.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn update_email(&self, subject: &str, email: &str) -> Result<LocalUser, StoreError> {
        let mut user = self
            .users
            .get_mut(subject)
            .ok_or_else(|| StoreError::NotFound(subject.to_string()))?;
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}
