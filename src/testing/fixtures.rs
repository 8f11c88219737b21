//! Test fixtures providing pre-built test objects

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{AttributeMapping, IdentityProvider, NewProvider, User, UserRole};
use crate::registry::{MemoryProviderStore, SharedProviderStore};
use crate::session::TokenIssuer;
use crate::settings::SamlGateSettings;
use crate::users::{MemoryUserStore, SharedUserStore};

use super::constants::{TEST_EMAIL, TEST_IDP_ENTITY_ID, TEST_IDP_SSO_URL, TEST_SESSION_SECRET};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with a fixed secret and insecure cookies, suitable for
    /// `actix_web::test` requests
    #[must_use]
    pub fn settings() -> SamlGateSettings {
        let mut settings = SamlGateSettings::default();
        settings.session.session_secret = TEST_SESSION_SECRET.to_string();
        settings.cookies.secure = false;
        settings
    }

    /// A self-signed X.509 certificate (PEM) usable as an IdP signing
    /// certificate
    ///
    /// Generated once per process; RSA key generation is too slow to repeat
    /// in every test.
    #[must_use]
    pub fn certificate() -> String {
        static CERT: OnceLock<String> = OnceLock::new();
        CERT.get_or_init(Self::generate_certificate).clone()
    }

    fn generate_certificate() -> String {
        use openssl::{
            asn1::Asn1Time,
            bn::BigNum,
            hash::MessageDigest,
            pkey::PKey,
            rsa::Rsa,
            x509::{X509Builder, X509NameBuilder},
        };

        let rsa = Rsa::generate(2048).unwrap();
        let private_key = PKey::from_rsa(rsa).unwrap();

        let mut x509_name = X509NameBuilder::new().unwrap();
        x509_name
            .append_entry_by_text("CN", "test-idp.example.com")
            .unwrap();
        let x509_name = x509_name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();

        let serial_number = BigNum::from_u32(1).unwrap();
        builder
            .set_serial_number(&serial_number.to_asn1_integer().unwrap())
            .unwrap();

        builder.set_subject_name(&x509_name).unwrap();
        builder.set_issuer_name(&x509_name).unwrap();
        builder.set_pubkey(&private_key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder.sign(&private_key, MessageDigest::sha256()).unwrap();

        String::from_utf8(builder.build().to_pem().unwrap()).unwrap()
    }

    /// Creation payload for a valid test provider
    #[must_use]
    pub fn new_provider(entity_id: &str) -> NewProvider {
        NewProvider {
            name: "Test IdP".to_string(),
            entity_id: entity_id.to_string(),
            sso_url: TEST_IDP_SSO_URL.to_string(),
            sso_logout_url: None,
            certificate: Self::certificate(),
            auto_provision: true,
            default_role: UserRole::Client,
            attribute_mapping: AttributeMapping {
                email: "email".to_string(),
                first_name: "firstName".to_string(),
                last_name: "lastName".to_string(),
                display_name: Some("displayName".to_string()),
            },
            is_active: true,
        }
    }

    /// A complete provider record, not persisted anywhere
    #[must_use]
    pub fn provider() -> IdentityProvider {
        let fields = Self::new_provider(TEST_IDP_ENTITY_ID);
        IdentityProvider {
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
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Empty in-memory provider store
    #[must_use]
    pub fn provider_store() -> SharedProviderStore {
        Arc::new(MemoryProviderStore::new())
    }

    /// Empty in-memory user store
    #[must_use]
    pub fn user_store() -> SharedUserStore {
        Arc::new(MemoryUserStore::new())
    }

    /// Token issuer matching [`TestFixtures::settings`]
    #[must_use]
    pub fn token_issuer() -> TokenIssuer {
        TokenIssuer::new(TEST_SESSION_SECRET, "samlgate-test", 60)
    }

    /// A user record with the given role
    #[must_use]
    pub fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: TEST_EMAIL.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            display_name: Some("Test User".to_string()),
            role,
            sso_provider_id: None,
            created_at: Utc::now(),
        }
    }

    /// Bearer token for an admin user, minted by
    /// [`TestFixtures::token_issuer`]
    ///
    /// # Panics
    ///
    /// Panics if minting fails, which would be a bug in the fixtures
    #[must_use]
    pub fn admin_token() -> String {
        Self::token_issuer().issue(&Self::user(UserRole::Admin)).unwrap()
    }

    /// Bearer token for a non-admin user
    ///
    /// # Panics
    ///
    /// Panics if minting fails, which would be a bug in the fixtures
    #[must_use]
    pub fn client_token() -> String {
        Self::token_issuer()
            .issue(&Self::user(UserRole::Client))
            .unwrap()
    }
}
