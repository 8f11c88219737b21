// Assertion callback: the IdP posts the signed response here
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::login::parse_provider_id;
use crate::registry::SharedProviderStore;
use crate::saml::{strategy::peek_response_size, SamlStrategy, StrategyError};
use crate::session::TokenIssuer;
use crate::settings::SamlGateSettings;
use crate::users::{find_or_create_user, ResolverError, SharedUserStore};
use crate::utils::cookies::{create_expired_state_cookie, get_state_from_request};
use crate::utils::crypto::derive_encryption_key;
use crate::utils::error_handler::ErrorHandler;
use crate::utils::responses::ResponseBuilder;

/// Form body of the HTTP-POST binding
#[derive(Deserialize, Debug)]
pub struct SamlCallbackForm {
    #[serde(rename = "SAMLResponse")]
    pub saml_response: Option<String>,
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// Consume a SAML response and finish the login
///
/// Stateless per request: the provider record is re-fetched and the
/// strategy rebuilt, with no assumption that this process handled the
/// initiation. Verification and resolution failures are collapsed into
/// coarse-coded redirects to the frontend login page — the caller is a
/// browser mid-navigation, not an API consumer — while the full detail is
/// logged here with the provider ID.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` (404, `PROVIDER_NOT_FOUND`) if the
/// provider is unknown or inactive — including when it vanished between
/// initiation and callback
pub async fn saml_callback(
    path: web::Path<String>,
    form: web::Form<SamlCallbackForm>,
    req: HttpRequest,
    registry: web::Data<SharedProviderStore>,
    users: web::Data<SharedUserStore>,
    token_issuer: web::Data<TokenIssuer>,
    settings: web::Data<SamlGateSettings>,
) -> Result<HttpResponse, ServiceError> {
    let provider_id = parse_provider_id(&path)?;

    let provider = registry
        .get(provider_id)
        .await
        .filter(|p| p.is_active)
        .ok_or_else(ServiceError::provider_not_found)?;

    let login_url = settings.frontend_login_url();
    let clear_cookie = create_expired_state_cookie(settings.cookies.secure);

    let Some(saml_response) = form.saml_response.as_deref() else {
        error!("Callback for provider {provider_id} carried no SAMLResponse");
        return Ok(ErrorHandler::sso_error_redirect(
            &login_url,
            "saml_auth_failed",
            clear_cookie,
        ));
    };
    debug!(
        "Callback for provider {provider_id}: response {} bytes, relay_state={:?}",
        peek_response_size(saml_response).unwrap_or(0),
        form.relay_state
    );

    // Correlation cookie is optional; when present and matching it supplies
    // the AuthnRequest ID for the InResponseTo check
    let encryption_key = derive_encryption_key(settings.session.session_secret.as_bytes());
    let login_state = get_state_from_request(&req, &encryption_key)
        .filter(|state| state.provider_id == provider_id);
    if login_state.is_none() {
        debug!("No usable login-state cookie for provider {provider_id}; skipping InResponseTo");
    }
    let expected_request_id = login_state.as_ref().map(|s| s.request_id.as_str());

    let strategy =
        match SamlStrategy::build(&provider, settings.sp_entity_id(), &settings.callback_url_for(provider_id)) {
            Ok(strategy) => strategy,
            Err(e) => {
                error!("Provider {provider_id} strategy rebuild failed at callback: {e}");
                return Ok(ErrorHandler::sso_error_redirect(
                    &login_url,
                    "saml_processing_failed",
                    clear_cookie,
                ));
            }
        };

    let assertion = match strategy.verify_response(saml_response, expected_request_id) {
        Ok(assertion) => assertion,
        Err(e @ (StrategyError::Verification(_) | StrategyError::Configuration(_))) => {
            error!("Assertion verification failed for provider {provider_id}: {e}");
            return Ok(ErrorHandler::sso_error_redirect(
                &login_url,
                "saml_auth_failed",
                clear_cookie,
            ));
        }
        Err(e @ StrategyError::MissingSubject) => {
            error!("Assertion for provider {provider_id} has no subject: {e}");
            return Ok(ErrorHandler::sso_error_redirect(
                &login_url,
                "saml_no_user",
                clear_cookie,
            ));
        }
    };

    let resolved = match find_or_create_user(&assertion, &provider, users.get_ref().as_ref()).await
    {
        Ok(resolved) => resolved,
        Err(e @ ResolverError::MissingEmail) => {
            error!("Assertion for provider {provider_id} maps to no user: {e}");
            return Ok(ErrorHandler::sso_error_redirect(
                &login_url,
                "saml_no_user",
                clear_cookie,
            ));
        }
        Err(e) => {
            error!("Identity resolution failed for provider {provider_id}: {e}");
            return Ok(ErrorHandler::sso_error_redirect(
                &login_url,
                "saml_processing_failed",
                clear_cookie,
            ));
        }
    };

    let token = match token_issuer.issue(&resolved.user) {
        Ok(token) => token,
        Err(e) => {
            error!("Token minting failed for provider {provider_id}: {e}");
            return Ok(ErrorHandler::sso_error_redirect(
                &login_url,
                "saml_processing_failed",
                clear_cookie,
            ));
        }
    };

    info!(
        "SSO login completed for '{}' via provider {provider_id} (new={})",
        resolved.user.email, resolved.is_new
    );

    let mut location = format!(
        "{}?token={}",
        settings.frontend_auth_callback_url(),
        urlencoding::encode(&token)
    );
    if resolved.is_new {
        location.push_str("&new=true");
    }

    Ok(ResponseBuilder::redirect(&location)
        .with_cookie(clear_cookie)
        .build())
}
