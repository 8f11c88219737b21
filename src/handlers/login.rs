// Login initiation: redirect the browser to the provider's IdP
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{error, info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::SsoState;
use crate::registry::SharedProviderStore;
use crate::saml::SamlStrategy;
use crate::settings::SamlGateSettings;
use crate::utils::cookies::create_state_cookie;
use crate::utils::crypto::{derive_encryption_key, generate_relay_token};
use crate::utils::responses::ResponseBuilder;

/// Start the SSO handshake for one provider
///
/// Builds a fresh strategy around the provider-specific callback URL and
/// issues the redirect to the IdP. The login-state cookie set here is
/// correlation only; the callback works without it.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` (404, `PROVIDER_NOT_FOUND`) if the
/// provider is unknown or inactive, and `ServiceError::Internal` if the
/// provider record cannot produce a working strategy
pub async fn initiate_login(
    path: web::Path<String>,
    registry: web::Data<SharedProviderStore>,
    settings: web::Data<SamlGateSettings>,
) -> Result<HttpResponse, ServiceError> {
    let provider_id = parse_provider_id(&path)?;

    // Re-read the registry on every request; the record may have changed
    // since the provider list was served
    let provider = registry
        .get(provider_id)
        .await
        .filter(|p| p.is_active)
        .ok_or_else(ServiceError::provider_not_found)?;

    let callback_url = settings.callback_url_for(provider_id);
    let strategy = SamlStrategy::build(&provider, settings.sp_entity_id(), &callback_url)
        .map_err(|e| {
            error!("Provider {provider_id} cannot build a strategy: {e}");
            ServiceError::Internal(format!("strategy build failed for {provider_id}: {e}"))
        })?;

    let relay_state = generate_relay_token();
    let redirect = strategy.login_redirect(&relay_state).map_err(|e| {
        error!("Provider {provider_id} AuthnRequest generation failed: {e}");
        ServiceError::Internal(format!("AuthnRequest generation failed: {e}"))
    })?;

    info!(
        "Redirecting to IdP '{}' for provider {provider_id}",
        provider.name
    );

    let state = SsoState {
        provider_id,
        request_id: redirect.request_id,
        relay_state,
        created_at: Utc::now(),
    };
    let encryption_key = derive_encryption_key(settings.session.session_secret.as_bytes());

    let mut response = ResponseBuilder::redirect(&redirect.url);
    match create_state_cookie(&state, &encryption_key, settings.cookies.secure) {
        Ok(cookie) => response = response.with_cookie(cookie),
        Err(e) => {
            // Correlation is optional; the flow continues without it
            warn!("Failed to set login-state cookie for provider {provider_id}: {e}");
        }
    }

    Ok(response.build())
}

/// Parse the path segment as a provider ID
///
/// A malformed ID is indistinguishable from an unknown one to the caller:
/// both are 404 `PROVIDER_NOT_FOUND`.
pub fn parse_provider_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::provider_not_found())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_id_rejects_garbage() {
        assert!(parse_provider_id("not-a-uuid").is_err());
        assert!(parse_provider_id("").is_err());

        let id = Uuid::new_v4();
        assert_eq!(parse_provider_id(&id.to_string()).unwrap(), id);
    }
}
