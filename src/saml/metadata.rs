//! Service Provider metadata publishing
//!
//! IdP administrators configure their side of an integration from this
//! document. It is a pure function of the SP entity ID and the
//! assertion-consumer URL; no provider-specific state is involved, which is
//! why the endpoint serving it is public and unauthenticated.

/// Generate the SP metadata XML document
///
/// Deterministic given its inputs. Advertises a single HTTP-POST
/// assertion-consumer service and the emailAddress NameID format the
/// identity resolver keys on.
#[must_use]
pub fn generate_sp_metadata(entity_id: &str, callback_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{entity_id}">
  <md:SPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:NameIDFormat>urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress</md:NameIDFormat>
    <md:AssertionConsumerService
        Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
        Location="{callback_url}"
        index="0"/>
  </md:SPSSODescriptor>
</md:EntityDescriptor>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_structure() {
        let metadata = generate_sp_metadata(
            "https://gateway.example.com",
            "https://gateway.example.com/saml/callback/abc",
        );

        assert!(metadata.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(metadata.contains("<md:EntityDescriptor"));
        assert!(metadata.contains("entityID=\"https://gateway.example.com\""));
        assert!(metadata.contains("<md:SPSSODescriptor"));
        assert!(
            metadata.contains("protocolSupportEnumeration=\"urn:oasis:names:tc:SAML:2.0:protocol\"")
        );
        assert!(metadata.contains("<md:AssertionConsumerService"));
        assert!(metadata.contains("Binding=\"urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST\""));
        assert!(
            metadata.contains("Location=\"https://gateway.example.com/saml/callback/abc\"")
        );
        assert!(metadata.contains(
            "<md:NameIDFormat>urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress</md:NameIDFormat>"
        ));
        assert!(metadata.contains("</md:SPSSODescriptor>"));
        assert!(metadata.contains("</md:EntityDescriptor>"));
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = generate_sp_metadata("X", "Y");

        // The document must survive a parse by the same SAML stack that
        // IdP-side tooling uses
        let descriptor: samael::metadata::EntityDescriptor =
            samael::metadata::de::from_str(&metadata).unwrap();
        assert_eq!(descriptor.entity_id.as_deref(), Some("X"));

        let sp_descriptors = descriptor.sp_sso_descriptors.unwrap();
        assert_eq!(sp_descriptors.len(), 1);
        let acs = &sp_descriptors[0].assertion_consumer_services[0];
        assert_eq!(acs.location, "Y");
        assert_eq!(
            acs.binding,
            "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
        );
    }

    #[test]
    fn test_metadata_is_deterministic() {
        let a = generate_sp_metadata("https://sp", "https://sp/acs");
        let b = generate_sp_metadata("https://sp", "https://sp/acs");
        assert_eq!(a, b);
    }
}
