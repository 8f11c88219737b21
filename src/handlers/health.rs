use actix_web::{HttpResponse, Result};

use crate::models::HealthResponse;

/// Health check endpoint
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "SamlGate SSO Gateway is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
