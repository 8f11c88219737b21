// HTTP request handlers for the SSO gateway
pub mod admin;
pub mod callback;
pub mod health;
pub mod login;
pub mod metadata;
pub mod providers;

// Re-export the main handler functions
pub use admin::{create_provider, delete_provider, list_all_providers, update_provider};
pub use callback::saml_callback;
pub use health::health;
pub use login::initiate_login;
pub use metadata::sp_metadata;
pub use providers::list_providers;

use actix_web::web;

/// Wire the gateway's routes into an actix service configuration
///
/// Shared between the binary and the integration tests so both exercise
/// the same surface.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public SSO endpoints
        .route("/saml/providers", web::get().to(list_providers))
        .route("/saml/login/{provider_id}", web::get().to(initiate_login))
        .route("/saml/callback/{provider_id}", web::post().to(saml_callback))
        .route("/saml/metadata", web::get().to(sp_metadata))
        // Admin endpoints
        .route("/saml/admin/providers", web::get().to(list_all_providers))
        .route("/saml/admin/providers", web::post().to(create_provider))
        .route(
            "/saml/admin/providers/{provider_id}",
            web::put().to(update_provider),
        )
        .route(
            "/saml/admin/providers/{provider_id}",
            web::delete().to(delete_provider),
        )
        // Health endpoint
        .route("/ping", web::get().to(health));
}
