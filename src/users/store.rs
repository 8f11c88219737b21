//! User store seam
//!
//! The gateway does not own user accounts; it reads them and, under
//! auto-provisioning, requests creation. The store's uniqueness constraint
//! on email is the only synchronization the resolver relies on under
//! concurrent callbacks, so every implementation must report duplicate
//! creation as [`UserStoreError::DuplicateEmail`] rather than clobbering or
//! silently succeeding.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{User, UserRole};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UserStoreError {
    /// A user with this email already exists; under a callback race this
    /// means someone else resolved the identity first
    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("user store failure: {0}")]
    Backend(String),
}

/// Fields for a JIT-provisioned account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub sso_provider_id: Option<Uuid>,
}

/// Shared handle to a user store implementation
pub type SharedUserStore = Arc<dyn UserStore>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email, the sole identity-matching key
    async fn find_by_email(&self, email: &str) -> Option<User>;

    /// Create a user
    ///
    /// # Errors
    ///
    /// Returns `UserStoreError::DuplicateEmail` if the email is taken
    async fn create(&self, fields: NewUser) -> Result<User, UserStoreError>;
}

/// In-memory user store keyed by email
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.get(email).cloned()
    }

    async fn create(&self, fields: NewUser) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;

        if users.contains_key(&fields.email) {
            return Err(UserStoreError::DuplicateEmail(fields.email));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: fields.email.clone(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            display_name: fields.display_name,
            role: fields.role,
            sso_provider_id: fields.sso_provider_id,
            created_at: Utc::now(),
        };
        users.insert(fields.email, user.clone());

        Ok(user)
    }
}
