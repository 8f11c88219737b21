//! Field-by-field validation of admin provider payloads
//!
//! Checks shape only: URLs must parse, required strings must be non-empty.
//! Whether a certificate actually verifies anything is decided when a
//! strategy is built from it, not here.

use url::Url;

use crate::errors::{FieldError, ServiceError};
use crate::models::{NewProvider, ProviderUpdate};

/// Validate a provider-creation payload
///
/// # Errors
///
/// Returns `ServiceError::Validation` listing every failing field
pub fn validate_new_provider(fields: &NewProvider) -> Result<(), ServiceError> {
    let mut errors = Vec::new();

    check_non_empty(&mut errors, "name", &fields.name);
    check_non_empty(&mut errors, "entity_id", &fields.entity_id);
    check_url(&mut errors, "sso_url", &fields.sso_url);
    if let Some(logout_url) = &fields.sso_logout_url {
        check_url(&mut errors, "sso_logout_url", logout_url);
    }
    check_non_empty(&mut errors, "certificate", &fields.certificate);
    check_non_empty(
        &mut errors,
        "attribute_mapping.email",
        &fields.attribute_mapping.email,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(errors))
    }
}

/// Validate a partial provider update; only present fields are checked
///
/// # Errors
///
/// Returns `ServiceError::Validation` listing every failing field
pub fn validate_provider_update(update: &ProviderUpdate) -> Result<(), ServiceError> {
    let mut errors = Vec::new();

    if let Some(name) = &update.name {
        check_non_empty(&mut errors, "name", name);
    }
    if let Some(entity_id) = &update.entity_id {
        check_non_empty(&mut errors, "entity_id", entity_id);
    }
    if let Some(sso_url) = &update.sso_url {
        check_url(&mut errors, "sso_url", sso_url);
    }
    if let Some(logout_url) = &update.sso_logout_url {
        check_url(&mut errors, "sso_logout_url", logout_url);
    }
    if let Some(certificate) = &update.certificate {
        check_non_empty(&mut errors, "certificate", certificate);
    }
    if let Some(mapping) = &update.attribute_mapping {
        check_non_empty(&mut errors, "attribute_mapping.email", &mapping.email);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(errors))
    }
}

fn check_non_empty(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
}

fn check_url(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(_) => errors.push(FieldError::new(field, "must be an http(s) URL")),
        Err(_) => errors.push(FieldError::new(field, "must be a well-formed URL")),
    }
}
