//! Service error taxonomy
//!
//! API-facing failures are converted centrally into structured JSON error
//! responses. SSO callback failures deliberately do NOT go through this path:
//! the caller at that point is a browser mid-navigation, so the callback
//! handler collapses them into coarse-coded redirects instead (see
//! `handlers::callback`).

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Serialize, Clone, Debug)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown or inactive resource; `code` is machine-readable
    /// (e.g. `PROVIDER_NOT_FOUND`)
    #[error("{code}: {message}")]
    NotFound { code: &'static str, message: String },

    /// Malformed admin input, reported field-by-field
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Missing or invalid credentials
    #[error("authentication required")]
    Authentication,

    /// Authenticated but lacking the admin role
    #[error("forbidden")]
    Forbidden,

    /// Anything that should never leak detail to the client
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    #[must_use]
    pub fn provider_not_found() -> Self {
        Self::NotFound {
            code: "PROVIDER_NOT_FOUND",
            message: "Identity provider not found".to_string(),
        }
    }

    #[must_use]
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Validation(fields)
    }

    fn error_code(&self) -> &str {
        match self {
            Self::NotFound { code, .. } => code,
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound { message, .. } => message.clone(),
            Self::Validation(_) => "One or more fields failed validation".to_string(),
            Self::Authentication => "Authentication is required to access this resource".to_string(),
            Self::Forbidden => "Administrator access is required".to_string(),
            // Internal detail stays in the server log
            Self::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(detail) = self {
            log::error!("Internal error: {detail}");
        }

        let mut error = json!({
            "code": self.error_code(),
            "message": self.public_message(),
        });
        if let Self::Validation(fields) = self {
            error["fields"] = json!(fields);
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": error,
        }))
    }
}
