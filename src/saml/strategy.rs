//! Per-request SSO strategy
//!
//! A [`SamlStrategy`] bundles everything needed to send a user to an IdP and
//! to verify what comes back: an AuthnRequest generator targeting the
//! provider's SSO URL, and a response verifier keyed to the provider's
//! signing certificate and attribute mapping.
//!
//! Strategies are pure values built from `(provider, callback_url)` and are
//! rebuilt on every request. The callback URL embeds the provider ID as a
//! path segment, so a strategy cached across requests could carry a stale
//! ACS URL; verification must then fail rather than accept a mismatched
//! destination. Rebuilding per request also means no shared registry exists
//! to race on when concurrent logins hit different providers.

use base64::{engine::general_purpose::STANDARD, Engine};
use samael::metadata::EntityDescriptor;
use samael::service_provider::{ServiceProvider, ServiceProviderBuilder};
use thiserror::Error;

use crate::models::{AttributeMapping, IdentityProvider};

/// NameID format requested from IdPs
const NAME_ID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";

#[derive(Error, Debug)]
pub enum StrategyError {
    /// Provider record cannot be turned into a working strategy
    /// (bad certificate, malformed URLs)
    #[error("invalid provider configuration: {0}")]
    Configuration(String),

    /// Inbound response failed signature, audience or schema checks
    #[error("SAML response verification failed: {0}")]
    Verification(String),

    /// Response verified but carries no subject identifier
    #[error("assertion missing subject NameID")]
    MissingSubject,
}

/// Redirect produced by login initiation
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// IdP SSO URL carrying the encoded AuthnRequest and relay state
    pub url: String,
    /// AuthnRequest ID, later matched against `InResponseTo`
    pub request_id: String,
}

/// Validated claim set extracted from an assertion
///
/// Consumed immediately by the identity resolver; never persisted.
#[derive(Debug, Clone)]
pub struct SamlAssertionData {
    /// IdP-asserted subject identifier (NameID)
    pub subject_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
}

/// Transient SSO handshake configuration for one provider and one request
pub struct SamlStrategy {
    sp: ServiceProvider,
    sso_url: String,
    attribute_mapping: AttributeMapping,
}

impl SamlStrategy {
    /// Build a strategy for one request
    ///
    /// Pure function of its inputs: the provider record, this gateway's SP
    /// entity ID and the request-derived assertion-consumer URL.
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::Configuration` if the provider's certificate
    /// or URLs cannot form a valid service-provider configuration. This is
    /// where certificate well-formedness surfaces; the registry stores
    /// whatever the admin submitted.
    pub fn build(
        provider: &IdentityProvider,
        sp_entity_id: &str,
        callback_url: &str,
    ) -> Result<Self, StrategyError> {
        let idp_metadata = build_idp_metadata(provider)?;

        let sp = ServiceProviderBuilder::default()
            .entity_id(sp_entity_id.to_string())
            .acs_url(callback_url.to_string())
            .idp_metadata(idp_metadata)
            .authn_name_id_format(NAME_ID_FORMAT_EMAIL.to_string())
            .build()
            .map_err(|e| {
                StrategyError::Configuration(format!("failed to build service provider: {e}"))
            })?;

        Ok(Self {
            sp,
            sso_url: provider.sso_url.clone(),
            attribute_mapping: provider.attribute_mapping.clone(),
        })
    }

    /// Produce the redirect that starts the handshake at the IdP
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::Configuration` if the AuthnRequest cannot be
    /// generated or encoded
    pub fn login_redirect(&self, relay_state: &str) -> Result<LoginRedirect, StrategyError> {
        let authn_request = self
            .sp
            .make_authentication_request(&self.sso_url)
            .map_err(|e| {
                StrategyError::Configuration(format!("failed to create AuthnRequest: {e}"))
            })?;

        let request_id = authn_request.id.clone();

        let url = authn_request
            .redirect(relay_state)
            .map_err(|e| {
                StrategyError::Configuration(format!("failed to encode AuthnRequest: {e}"))
            })?
            .ok_or_else(|| {
                StrategyError::Configuration("AuthnRequest has no destination".to_string())
            })?;

        Ok(LoginRedirect {
            url: url.to_string(),
            request_id,
        })
    }

    /// Verify a base64-encoded SAML response and extract mapped attributes
    ///
    /// Signature is checked against the provider certificate baked into this
    /// strategy; `expected_request_id` enforces `InResponseTo` when the
    /// initiating browser kept its login-state cookie, and is skipped
    /// otherwise (the callback must work on a process that never saw the
    /// initiation).
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::Verification` on any signature, audience,
    /// expiry or schema failure, and `StrategyError::MissingSubject` if the
    /// verified assertion has no NameID
    pub fn verify_response(
        &self,
        saml_response_b64: &str,
        expected_request_id: Option<&str>,
    ) -> Result<SamlAssertionData, StrategyError> {
        let possible_request_ids: Vec<&str> = expected_request_id.into_iter().collect();
        let request_ids = if possible_request_ids.is_empty() {
            None
        } else {
            Some(possible_request_ids.as_slice())
        };

        let assertion = self
            .sp
            .parse_base64_response(saml_response_b64, request_ids)
            .map_err(|e| StrategyError::Verification(e.to_string()))?;

        let subject_id = assertion
            .subject
            .as_ref()
            .and_then(|s| s.name_id.as_ref())
            .map(|n| n.value.clone())
            .ok_or(StrategyError::MissingSubject)?;

        Ok(SamlAssertionData {
            subject_id,
            email: extract_attribute(&assertion, &self.attribute_mapping.email),
            first_name: extract_attribute(&assertion, &self.attribute_mapping.first_name),
            last_name: extract_attribute(&assertion, &self.attribute_mapping.last_name),
            display_name: self
                .attribute_mapping
                .display_name
                .as_ref()
                .and_then(|name| extract_attribute(&assertion, name)),
        })
    }
}

/// Build an IdP `EntityDescriptor` from a provider record
///
/// The registry stores entity ID, SSO URL and certificate as separate
/// fields; samael wants them as a metadata document.
fn build_idp_metadata(provider: &IdentityProvider) -> Result<EntityDescriptor, StrategyError> {
    let xml = format!(
        r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{}">
    <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
        <md:KeyDescriptor use="signing">
            <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
                <ds:X509Data>
                    <ds:X509Certificate>{}</ds:X509Certificate>
                </ds:X509Data>
            </ds:KeyInfo>
        </md:KeyDescriptor>
        <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="{}"/>
    </md:IDPSSODescriptor>
</md:EntityDescriptor>"#,
        provider.entity_id,
        strip_pem_headers(&provider.certificate),
        provider.sso_url,
    );

    samael::metadata::de::from_str(&xml).map_err(|e| {
        StrategyError::Configuration(format!("failed to build IdP metadata: {e}"))
    })
}

/// Strip PEM armor from a certificate, leaving raw base64
fn strip_pem_headers(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.starts_with("-----BEGIN") && !line.starts_with("-----END"))
        .collect::<Vec<_>>()
        .join("")
}

/// Extract the first value of a named attribute from an assertion
///
/// Matches either the attribute name or its friendly name, mirroring how
/// IdPs interchangeably send `urn:oid` names and short labels.
fn extract_attribute(assertion: &samael::schema::Assertion, attr_name: &str) -> Option<String> {
    let statements = assertion.attribute_statements.as_ref()?;

    for statement in statements {
        for attr in &statement.attributes {
            if attr.name.as_deref() == Some(attr_name)
                || attr.friendly_name.as_deref() == Some(attr_name)
            {
                return attr
                    .values
                    .first()
                    .map(|v| v.value.clone().unwrap_or_default());
            }
        }
    }

    None
}

/// Decode a base64 SAML response without verifying it
///
/// Used only for diagnostic logging of hopeless payloads; trust decisions
/// always go through [`SamlStrategy::verify_response`].
#[must_use]
pub fn peek_response_size(saml_response_b64: &str) -> Option<usize> {
    STANDARD.decode(saml_response_b64).ok().map(|b| b.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixtures;

    fn test_provider() -> IdentityProvider {
        TestFixtures::provider()
    }

    #[test]
    fn test_build_strategy() {
        let provider = test_provider();
        let strategy = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        );
        assert!(strategy.is_ok());
    }

    #[test]
    fn test_login_redirect_targets_sso_url() {
        let provider = test_provider();
        let strategy = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        )
        .unwrap();

        let redirect = strategy.login_redirect("relay-123").unwrap();

        assert!(redirect.url.starts_with("https://idp.example.com/sso?"));
        assert!(redirect.url.contains("SAMLRequest="));
        assert!(redirect.url.contains("RelayState="));
        assert!(!redirect.request_id.is_empty());
    }

    #[test]
    fn test_distinct_requests_get_distinct_ids() {
        let provider = test_provider();
        let strategy = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        )
        .unwrap();

        let first = strategy.login_redirect("relay-1").unwrap();
        let second = strategy.login_redirect("relay-2").unwrap();
        assert_ne!(first.request_id, second.request_id);
    }

    #[test]
    fn test_verify_rejects_invalid_base64() {
        let provider = test_provider();
        let strategy = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        )
        .unwrap();

        let err = strategy
            .verify_response("!!!not-base64!!!", None)
            .unwrap_err();
        assert!(matches!(err, StrategyError::Verification(_)));
    }

    #[test]
    fn test_verify_rejects_non_saml_xml() {
        let provider = test_provider();
        let strategy = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        )
        .unwrap();

        let payload = STANDARD.encode(r#"<?xml version="1.0"?><NotASamlResponse/>"#);
        let err = strategy.verify_response(&payload, None).unwrap_err();
        assert!(matches!(err, StrategyError::Verification(_)));
    }

    #[test]
    fn test_build_rejects_garbage_certificate() {
        let mut provider = test_provider();
        provider.certificate = "<not base64 at all>".to_string();

        let result = SamlStrategy::build(
            &provider,
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        );
        // The certificate lands inside the metadata XML; angle brackets make
        // it unparseable
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_pem_headers() {
        let pem = "-----BEGIN CERTIFICATE-----\nMIICpDCC\nb2NhbGhv\n-----END CERTIFICATE-----";
        let stripped = strip_pem_headers(pem);

        assert!(!stripped.contains("BEGIN"));
        assert!(!stripped.contains("END"));
        assert_eq!(stripped, "MIICpDCCb2NhbGhv");
    }

    #[test]
    fn test_peek_response_size() {
        let payload = STANDARD.encode(b"hello");
        assert_eq!(peek_response_size(&payload), Some(5));
        assert_eq!(peek_response_size("%%%"), None);
    }
}
