// Admin API: provider CRUD, gated on the admin role
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::errors::{FieldError, ServiceError};
use crate::handlers::login::parse_provider_id;
use crate::models::{NewProvider, ProviderUpdate};
use crate::registry::{RegistryError, SharedProviderStore};
use crate::session::{Claims, TokenIssuer};
use crate::settings::SamlGateSettings;
use crate::utils::responses::ResponseBuilder;
use crate::validation::{validate_new_provider, validate_provider_update};

/// Extract and verify the bearer token, requiring the admin role
///
/// Gating is a plain role-equality check; there is no scope model.
///
/// # Errors
///
/// Returns `ServiceError::Authentication` for a missing or invalid token
/// and `ServiceError::Forbidden` for a valid non-admin one
pub fn require_admin(req: &HttpRequest, issuer: &TokenIssuer) -> Result<Claims, ServiceError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ServiceError::Authentication)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ServiceError::Authentication)?;

    let claims = issuer
        .verify(token)
        .map_err(|_| ServiceError::Authentication)?;

    if claims.role != crate::models::UserRole::Admin {
        return Err(ServiceError::Forbidden);
    }

    Ok(claims)
}

/// Full provider listing, including inactive records and certificates
///
/// # Errors
///
/// Returns 401/403 on failed admin gating
pub async fn list_all_providers(
    req: HttpRequest,
    registry: web::Data<SharedProviderStore>,
    token_issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServiceError> {
    require_admin(&req, &token_issuer)?;

    let providers = registry.all_providers().await;
    Ok(ResponseBuilder::success(&providers))
}

/// Register a new identity provider
///
/// # Errors
///
/// Returns 401/403 on failed admin gating and 400 with field detail when
/// the payload fails validation or the `entity_id` is already registered
pub async fn create_provider(
    req: HttpRequest,
    payload: web::Json<NewProvider>,
    registry: web::Data<SharedProviderStore>,
    token_issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServiceError> {
    let claims = require_admin(&req, &token_issuer)?;

    let fields = payload.into_inner();
    validate_new_provider(&fields)?;

    let provider = registry.create(fields).await.map_err(registry_error)?;
    info!(
        "Admin '{}' registered provider '{}' ({})",
        claims.email, provider.name, provider.id
    );

    Ok(ResponseBuilder::created(&provider))
}

/// Partially update a provider
///
/// # Errors
///
/// Returns 401/403 on failed admin gating, 404 for an unknown ID and 400
/// with field detail when the update fails validation
pub async fn update_provider(
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Json<ProviderUpdate>,
    registry: web::Data<SharedProviderStore>,
    token_issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServiceError> {
    let claims = require_admin(&req, &token_issuer)?;
    let provider_id = parse_provider_id(&path)?;

    let update = payload.into_inner();
    validate_provider_update(&update)?;

    registry
        .update(provider_id, update)
        .await
        .map_err(registry_error)?;
    info!("Admin '{}' updated provider {provider_id}", claims.email);

    Ok(ResponseBuilder::message("Provider updated"))
}

/// Delete a provider
///
/// # Errors
///
/// Returns 401/403 on failed admin gating and 404 for an unknown ID
pub async fn delete_provider(
    req: HttpRequest,
    path: web::Path<String>,
    registry: web::Data<SharedProviderStore>,
    token_issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServiceError> {
    let claims = require_admin(&req, &token_issuer)?;
    let provider_id = parse_provider_id(&path)?;

    registry.delete(provider_id).await.map_err(registry_error)?;
    info!("Admin '{}' deleted provider {provider_id}", claims.email);

    Ok(ResponseBuilder::message("Provider deleted"))
}

/// Seed providers from configuration at startup
///
/// Runs through the same validation and uniqueness checks as the admin API
/// so a bad Settings.toml entry is reported, not silently registered.
///
/// # Errors
///
/// Returns the first seed entry that fails validation or collides
pub async fn seed_providers(
    settings: &SamlGateSettings,
    registry: &SharedProviderStore,
) -> Result<usize, ServiceError> {
    let mut count = 0;
    for seed in &settings.providers {
        let fields = NewProvider {
            name: seed.name.clone(),
            entity_id: seed.entity_id.clone(),
            sso_url: seed.sso_url.clone(),
            sso_logout_url: seed.sso_logout_url.clone(),
            certificate: seed.certificate.clone(),
            auto_provision: seed.auto_provision,
            default_role: seed.default_role,
            attribute_mapping: seed.attribute_mapping.clone().unwrap_or_default(),
            is_active: seed.is_active,
        };
        validate_new_provider(&fields)?;
        let provider = registry.create(fields).await.map_err(registry_error)?;
        info!(
            "Seeded provider '{}' ({}) from settings",
            provider.name, provider.id
        );
        count += 1;
    }
    Ok(count)
}

fn registry_error(err: RegistryError) -> ServiceError {
    match err {
        RegistryError::EntityIdTaken(entity_id) => ServiceError::validation(vec![FieldError::new(
            "entity_id",
            &format!("'{entity_id}' is already registered"),
        )]),
        RegistryError::NotFound => ServiceError::provider_not_found(),
    }
}
