//! Identity resolution (JIT provisioning)
//!
//! Maps a validated assertion to a local account. Email is the sole
//! matching key: a subject re-appearing under a different email gets a
//! fresh account rather than being linked to the old one. Reconciling by
//! the IdP subject identifier would change account-merge semantics for
//! every caller, so it stays out of scope here.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{IdentityProvider, User};
use crate::saml::SamlAssertionData;
use crate::users::store::{NewUser, UserStore, UserStoreError};

#[derive(Error, Debug)]
pub enum ResolverError {
    /// The mapped email attribute is absent or empty; nothing to match on
    #[error("assertion does not map to a usable email")]
    MissingEmail,

    /// No account exists and the provider forbids auto-provisioning
    #[error("auto-provisioning is disabled for provider {0}")]
    ProvisioningDisabled(Uuid),

    #[error("user store failure: {0}")]
    Store(String),
}

/// Result of identity resolution
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub user: User,
    pub is_new: bool,
}

/// Find the account matching an assertion, creating one if the provider
/// allows it
///
/// An existing account always wins, regardless of `auto_provision` — the
/// flag only gates creation. Concurrent callbacks for the same subject may
/// both reach the create path; the loser of that race observes the store's
/// duplicate-email error and falls back to re-fetching the winner's record.
///
/// # Errors
///
/// - `ResolverError::MissingEmail` if no email attribute was mapped
/// - `ResolverError::ProvisioningDisabled` if no account exists and
///   `provider.auto_provision` is false
/// - `ResolverError::Store` on backend failures
pub async fn find_or_create_user(
    assertion: &SamlAssertionData,
    provider: &IdentityProvider,
    store: &dyn UserStore,
) -> Result<ResolvedUser, ResolverError> {
    let email = assertion
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(ResolverError::MissingEmail)?;

    if let Some(user) = store.find_by_email(email).await {
        return Ok(ResolvedUser {
            user,
            is_new: false,
        });
    }

    if !provider.auto_provision {
        log::warn!(
            "No account for '{email}' and provider {} has auto-provisioning disabled",
            provider.id
        );
        return Err(ResolverError::ProvisioningDisabled(provider.id));
    }

    let fields = NewUser {
        email: email.to_string(),
        first_name: assertion.first_name.clone().unwrap_or_default(),
        last_name: assertion.last_name.clone().unwrap_or_default(),
        display_name: assertion.display_name.clone(),
        role: provider.default_role,
        sso_provider_id: Some(provider.id),
    };

    match store.create(fields).await {
        Ok(user) => {
            log::info!(
                "Provisioned user '{email}' with role {} via provider {}",
                user.role.as_str(),
                provider.id
            );
            Ok(ResolvedUser { user, is_new: true })
        }
        Err(UserStoreError::DuplicateEmail(_)) => {
            // A concurrent callback resolved this identity first
            let user = store
                .find_by_email(email)
                .await
                .ok_or_else(|| {
                    ResolverError::Store("user vanished after duplicate-email error".to_string())
                })?;
            Ok(ResolvedUser {
                user,
                is_new: false,
            })
        }
        Err(UserStoreError::Backend(msg)) => Err(ResolverError::Store(msg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeMapping, UserRole};
    use crate::users::store::MemoryUserStore;
    use chrono::Utc;

    fn provider(auto_provision: bool, default_role: UserRole) -> IdentityProvider {
        IdentityProvider {
            id: Uuid::new_v4(),
            name: "Test IdP".to_string(),
            entity_id: "https://idp.example.com".to_string(),
            sso_url: "https://idp.example.com/sso".to_string(),
            sso_logout_url: None,
            certificate: "cert".to_string(),
            auto_provision,
            default_role,
            attribute_mapping: AttributeMapping::default(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn assertion(email: Option<&str>) -> SamlAssertionData {
        SamlAssertionData {
            subject_id: "subject-1".to_string(),
            email: email.map(ToString::to_string),
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
            display_name: Some("Grace Hopper".to_string()),
        }
    }

    #[tokio::test]
    async fn test_provisions_new_user_with_default_role() {
        let store = MemoryUserStore::new();
        let provider = provider(true, UserRole::Vendor);

        let resolved = find_or_create_user(&assertion(Some("grace@example.com")), &provider, &store)
            .await
            .unwrap();

        assert!(resolved.is_new);
        assert_eq!(resolved.user.email, "grace@example.com");
        assert_eq!(resolved.user.role, UserRole::Vendor);
        assert_eq!(resolved.user.sso_provider_id, Some(provider.id));
        assert_eq!(resolved.user.first_name, "Grace");
    }

    #[tokio::test]
    async fn test_second_resolution_is_not_new() {
        let store = MemoryUserStore::new();
        let provider = provider(true, UserRole::Client);
        let data = assertion(Some("grace@example.com"));

        let first = find_or_create_user(&data, &provider, &store).await.unwrap();
        let second = find_or_create_user(&data, &provider, &store).await.unwrap();

        assert!(first.is_new);
        assert!(!second.is_new);
        assert_eq!(first.user.id, second.user.id);
    }

    #[tokio::test]
    async fn test_existing_user_wins_even_without_auto_provision() {
        let store = MemoryUserStore::new();
        store
            .create(NewUser {
                email: "grace@example.com".to_string(),
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                display_name: None,
                role: UserRole::Admin,
                sso_provider_id: None,
            })
            .await
            .unwrap();

        let provider = provider(false, UserRole::Client);
        let resolved = find_or_create_user(&assertion(Some("grace@example.com")), &provider, &store)
            .await
            .unwrap();

        assert!(!resolved.is_new);
        // Existing role is untouched by the provider's default
        assert_eq!(resolved.user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_provisioning_disabled_creates_nothing() {
        let store = MemoryUserStore::new();
        let provider = provider(false, UserRole::Client);

        let err = find_or_create_user(&assertion(Some("grace@example.com")), &provider, &store)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolverError::ProvisioningDisabled(_)));
        assert!(store.find_by_email("grace@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_email_rejected() {
        let store = MemoryUserStore::new();
        let provider = provider(true, UserRole::Client);

        let err = find_or_create_user(&assertion(None), &provider, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::MissingEmail));

        let mut empty = assertion(Some(""));
        empty.email = Some(String::new());
        let err = find_or_create_user(&empty, &provider, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::MissingEmail));
    }

    #[tokio::test]
    async fn test_duplicate_create_race_falls_back_to_fetch() {
        /// Store that reports a duplicate on create, simulating losing the
        /// race to a concurrent callback
        struct RacingStore {
            inner: MemoryUserStore,
        }

        #[async_trait::async_trait]
        impl UserStore for RacingStore {
            async fn find_by_email(&self, email: &str) -> Option<User> {
                self.inner.find_by_email(email).await
            }

            async fn create(&self, fields: NewUser) -> Result<User, UserStoreError> {
                // The "other request" wins just before our insert lands
                let _ = self.inner.create(fields.clone()).await;
                Err(UserStoreError::DuplicateEmail(fields.email))
            }
        }

        let store = RacingStore {
            inner: MemoryUserStore::new(),
        };
        let provider = provider(true, UserRole::Client);

        let resolved = find_or_create_user(&assertion(Some("grace@example.com")), &provider, &store)
            .await
            .unwrap();

        // The losing request still resolves, just not as the creator
        assert!(!resolved.is_new);
        assert_eq!(resolved.user.email, "grace@example.com");
    }
}
