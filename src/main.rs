#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use samlgate::{
    configure_routes,
    handlers::admin::seed_providers,
    registry::MemoryProviderStore,
    session::TokenIssuer,
    settings::SamlGateSettings,
    users::MemoryUserStore,
    SharedProviderStore, SharedUserStore,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = SamlGateSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let registry: SharedProviderStore = Arc::new(MemoryProviderStore::new());
    let users: SharedUserStore = Arc::new(MemoryUserStore::new());

    // Register configuration-seeded providers before accepting traffic
    let seeded = seed_providers(&settings, &registry)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to seed providers: {e}")))?;
    if seeded > 0 {
        println!("✓ Seeded {seeded} identity provider(s) from settings");
    }

    start_server(settings, registry, users).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: SamlGateSettings,
    registry: SharedProviderStore,
    users: SharedUserStore,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let token_issuer = TokenIssuer::new(
        &settings.session.session_secret,
        settings.sp_entity_id(),
        settings.session.token_ttl_minutes,
    );

    // Configure CORS for the SPA frontend
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(users.clone()))
            .app_data(web::Data::new(token_issuer.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &SamlGateSettings) {
    println!("Starting SamlGate SSO Gateway on http://{bind_address}");
    println!();
    println!("SSO endpoints:");
    println!("  GET  /saml/providers               - Active identity providers");
    println!("  GET  /saml/login/{{provider_id}}     - Redirect to the IdP");
    println!("  POST /saml/callback/{{provider_id}}  - Assertion consumer endpoint");
    println!("  GET  /saml/metadata                - SP metadata document");
    println!();
    println!("Admin endpoints (bearer token, admin role):");
    println!("  GET|POST   /saml/admin/providers");
    println!("  PUT|DELETE /saml/admin/providers/{{id}}");
    println!();
    println!("Assertion consumer URL for identity providers:");
    println!(
        "  {}/saml/callback/{{provider_id}}",
        settings.application.redirect_base_url
    );
    println!();
    println!("Frontend redirect targets:");
    println!("  Success: {}?token=...", settings.frontend_auth_callback_url());
    println!("  Failure: {}?error=...", settings.frontend_login_url());
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
