// Public provider listing: the first step of the SSO flow
use actix_web::{web, HttpResponse, Result};

use crate::models::ProviderSummary;
use crate::registry::SharedProviderStore;
use crate::utils::responses::ResponseBuilder;

/// List active identity providers
///
/// Public and unauthenticated; the response is reduced to
/// `{id, name, entity_id}` so signing certificates never leave the
/// admin surface.
pub async fn list_providers(registry: web::Data<SharedProviderStore>) -> Result<HttpResponse> {
    let providers = registry.active_providers().await;
    let summaries: Vec<ProviderSummary> = providers.iter().map(ProviderSummary::from).collect();

    Ok(ResponseBuilder::success(&summaries))
}
