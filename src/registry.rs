//! Identity provider registry
//!
//! Stores SAML IdP configurations managed through the admin API. The
//! orchestrator re-reads the registry on every login and callback request,
//! so records may change (or vanish) between the two steps of a flow and
//! handlers must re-fetch rather than hold onto a copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{IdentityProvider, NewProvider, ProviderUpdate};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// `entity_id` collides with an active provider
    #[error("entity_id '{0}' is already registered")]
    EntityIdTaken(String),

    #[error("provider not found")]
    NotFound,
}

/// Shared handle to a provider store implementation
pub type SharedProviderStore = Arc<dyn ProviderStore>;

/// Persistence seam for identity provider records
///
/// The gateway ships with [`MemoryProviderStore`]; a database-backed
/// implementation only needs to honor the active-`entity_id` uniqueness
/// invariant.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Providers eligible for login (`is_active` only)
    async fn active_providers(&self) -> Vec<IdentityProvider>;

    /// Every provider, including inactive ones (admin listing)
    async fn all_providers(&self) -> Vec<IdentityProvider>;

    /// Fetch a provider by ID regardless of active state
    async fn get(&self, id: Uuid) -> Option<IdentityProvider>;

    /// Register a provider
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EntityIdTaken` if `entity_id` collides with
    /// an active provider. A deleted provider's `entity_id` may be reused.
    async fn create(&self, fields: NewProvider) -> Result<IdentityProvider, RegistryError>;

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the ID is unknown, and
    /// `RegistryError::EntityIdTaken` if the update renames `entity_id`
    /// onto another active provider.
    async fn update(&self, id: Uuid, update: ProviderUpdate) -> Result<(), RegistryError>;

    /// Remove a provider
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the ID is unknown
    async fn delete(&self, id: Uuid) -> Result<(), RegistryError>;
}

/// In-memory provider store
#[derive(Default)]
pub struct MemoryProviderStore {
    providers: RwLock<HashMap<Uuid, IdentityProvider>>,
}

impl MemoryProviderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderStore for MemoryProviderStore {
    async fn active_providers(&self) -> Vec<IdentityProvider> {
        let providers = self.providers.read().await;
        let mut active: Vec<IdentityProvider> =
            providers.values().filter(|p| p.is_active).cloned().collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        active
    }

    async fn all_providers(&self) -> Vec<IdentityProvider> {
        let providers = self.providers.read().await;
        let mut all: Vec<IdentityProvider> = providers.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    async fn get(&self, id: Uuid) -> Option<IdentityProvider> {
        self.providers.read().await.get(&id).cloned()
    }

    async fn create(&self, fields: NewProvider) -> Result<IdentityProvider, RegistryError> {
        let mut providers = self.providers.write().await;

        if providers
            .values()
            .any(|p| p.is_active && p.entity_id == fields.entity_id)
        {
            return Err(RegistryError::EntityIdTaken(fields.entity_id));
        }

        let now = Utc::now();
        let provider = IdentityProvider {
            id: Uuid::new_v4(),
            name: fields.name,
            entity_id: fields.entity_id,
            sso_url: fields.sso_url,
            sso_logout_url: fields.sso_logout_url,
            certificate: fields.certificate,
            auto_provision: fields.auto_provision,
            default_role: fields.default_role,
            attribute_mapping: fields.attribute_mapping,
            is_active: fields.is_active,
            created_at: now,
            updated_at: now,
        };
        providers.insert(provider.id, provider.clone());

        Ok(provider)
    }

    async fn update(&self, id: Uuid, update: ProviderUpdate) -> Result<(), RegistryError> {
        let mut providers = self.providers.write().await;

        if !providers.contains_key(&id) {
            return Err(RegistryError::NotFound);
        }

        if let Some(new_entity_id) = &update.entity_id {
            if providers
                .values()
                .any(|p| p.id != id && p.is_active && &p.entity_id == new_entity_id)
            {
                return Err(RegistryError::EntityIdTaken(new_entity_id.clone()));
            }
        }

        let provider = providers
            .get_mut(&id)
            .ok_or(RegistryError::NotFound)?;
        update.apply_to(provider);

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RegistryError> {
        let mut providers = self.providers.write().await;
        providers
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound)
    }
}
