use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Role assigned to users provisioned through an identity provider
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Vendor,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
        }
    }
}

/// Correspondence between assertion attribute names and local user fields
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AttributeMapping {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self {
            email: "urn:oid:0.9.2342.19200300.100.1.3".to_string(),
            first_name: "urn:oid:2.5.4.42".to_string(),
            last_name: "urn:oid:2.5.4.4".to_string(),
            display_name: None,
        }
    }
}

/// A registered SAML Identity Provider
///
/// The certificate is the IdP's signing certificate (PEM) used to verify
/// inbound assertions. It is exposed only through the admin API; the public
/// provider listing is reduced to [`ProviderSummary`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IdentityProvider {
    pub id: Uuid,
    pub name: String,
    pub entity_id: String,
    pub sso_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_logout_url: Option<String>,
    pub certificate: String,
    pub auto_provision: bool,
    pub default_role: UserRole,
    pub attribute_mapping: AttributeMapping,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when registering a provider through the admin API
#[derive(Deserialize, Clone, Debug)]
pub struct NewProvider {
    pub name: String,
    pub entity_id: String,
    pub sso_url: String,
    pub sso_logout_url: Option<String>,
    pub certificate: String,
    #[serde(default = "default_auto_provision")]
    pub auto_provision: bool,
    #[serde(default = "default_role")]
    pub default_role: UserRole,
    #[serde(default)]
    pub attribute_mapping: AttributeMapping,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_auto_provision() -> bool {
    true
}

fn default_role() -> UserRole {
    UserRole::Client
}

fn default_is_active() -> bool {
    true
}

/// Partial update for an existing provider; absent fields are left untouched
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub entity_id: Option<String>,
    pub sso_url: Option<String>,
    pub sso_logout_url: Option<String>,
    pub certificate: Option<String>,
    pub auto_provision: Option<bool>,
    pub default_role: Option<UserRole>,
    pub attribute_mapping: Option<AttributeMapping>,
    pub is_active: Option<bool>,
}

impl ProviderUpdate {
    /// Apply this update to a provider record, bumping `updated_at`
    pub fn apply_to(self, provider: &mut IdentityProvider) {
        if let Some(name) = self.name {
            provider.name = name;
        }
        if let Some(entity_id) = self.entity_id {
            provider.entity_id = entity_id;
        }
        if let Some(sso_url) = self.sso_url {
            provider.sso_url = sso_url;
        }
        if let Some(sso_logout_url) = self.sso_logout_url {
            provider.sso_logout_url = Some(sso_logout_url);
        }
        if let Some(certificate) = self.certificate {
            provider.certificate = certificate;
        }
        if let Some(auto_provision) = self.auto_provision {
            provider.auto_provision = auto_provision;
        }
        if let Some(default_role) = self.default_role {
            provider.default_role = default_role;
        }
        if let Some(attribute_mapping) = self.attribute_mapping {
            provider.attribute_mapping = attribute_mapping;
        }
        if let Some(is_active) = self.is_active {
            provider.is_active = is_active;
        }
        provider.updated_at = Utc::now();
    }
}

/// Public view of a provider; never carries the certificate
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub entity_id: String,
}

impl From<&IdentityProvider> for ProviderSummary {
    fn from(provider: &IdentityProvider) -> Self {
        Self {
            id: provider.id,
            name: provider.name.clone(),
            entity_id: provider.entity_id.clone(),
        }
    }
}

/// A local user account resolved from an external assertion
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_provider_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Ephemeral login correlation state carried in an encrypted cookie
/// between login initiation and the assertion callback
///
/// Non-authoritative: the callback path parameter names the provider and the
/// assertion signature is the trust anchor. This exists so the callback can
/// log which initiation it correlates with and check `InResponseTo` when the
/// same browser completes the flow.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SsoState {
    pub provider_id: Uuid,
    pub request_id: String,
    pub relay_state: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_provider() -> IdentityProvider {
        IdentityProvider {
            id: Uuid::new_v4(),
            name: "Okta".to_string(),
            entity_id: "https://idp.example.com".to_string(),
            sso_url: "https://idp.example.com/sso".to_string(),
            sso_logout_url: None,
            certificate: "-----BEGIN CERTIFICATE-----".to_string(),
            auto_provision: true,
            default_role: UserRole::Client,
            attribute_mapping: AttributeMapping::default(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_provider_summary_excludes_certificate() {
        let provider = sample_provider();
        let summary = ProviderSummary::from(&provider);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["entity_id"], "https://idp.example.com");
        assert!(json.get("certificate").is_none());
        assert!(json.get("sso_url").is_none());
    }

    #[test]
    fn test_provider_update_partial_apply() {
        let mut provider = sample_provider();
        let original_entity_id = provider.entity_id.clone();
        let before = provider.updated_at;

        let update = ProviderUpdate {
            name: Some("Okta Prod".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        update.apply_to(&mut provider);

        assert_eq!(provider.name, "Okta Prod");
        assert!(!provider.is_active);
        // Untouched fields survive a partial update
        assert_eq!(provider.entity_id, original_entity_id);
        assert!(provider.auto_provision);
        assert!(provider.updated_at >= before);
    }

    #[test]
    fn test_user_role_serde_lowercase() {
        let role: UserRole = serde_json::from_str("\"vendor\"").unwrap();
        assert_eq!(role, UserRole::Vendor);
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert!(serde_json::from_str::<UserRole>("\"superuser\"").is_err());
    }

    #[test]
    fn test_new_provider_defaults() {
        let json = serde_json::json!({
            "name": "Azure AD",
            "entity_id": "https://sts.windows.net/abc",
            "sso_url": "https://login.microsoftonline.com/abc/saml2",
            "certificate": "cert"
        });
        let new_provider: NewProvider = serde_json::from_value(json).unwrap();

        assert!(new_provider.auto_provision);
        assert!(new_provider.is_active);
        assert_eq!(new_provider.default_role, UserRole::Client);
        assert!(!new_provider.attribute_mapping.email.is_empty());
    }
}
