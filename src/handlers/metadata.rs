// SP metadata endpoint for IdP-side configuration
use actix_web::{web, HttpResponse, Result};

use crate::saml::generate_sp_metadata;
use crate::settings::SamlGateSettings;

/// Serve this gateway's SP metadata document
///
/// Public and provider-agnostic; IdP administrators point their tooling at
/// it. The advertised assertion-consumer location is the callback family
/// root — each registered provider gets its own `/{provider_id}` segment
/// appended on the IdP side.
pub async fn sp_metadata(settings: web::Data<SamlGateSettings>) -> Result<HttpResponse> {
    let callback_url = format!(
        "{}/saml/callback",
        settings.application.redirect_base_url
    );
    let metadata = generate_sp_metadata(settings.sp_entity_id(), &callback_url);

    Ok(HttpResponse::Ok()
        .content_type("application/xml")
        .body(metadata))
}
