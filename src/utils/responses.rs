//! HTTP response handling helpers
//!
//! Consistent patterns for redirects and JSON envelopes used across the
//! handlers. Structured error responses for the API surface live on
//! `ServiceError`; this module covers the browser-facing redirect shapes
//! and success envelopes.

use actix_web::{cookie::Cookie, HttpResponse};
use serde_json::json;

/// Unified response builder for redirects and JSON envelopes
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a redirect response (302 Found)
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// 200 response with the `{success, data}` envelope
    #[must_use]
    pub fn success<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "success": true,
            "data": data,
        }))
    }

    /// 201 response with the `{success, data}` envelope
    #[must_use]
    pub fn created<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Created().json(json!({
            "success": true,
            "data": data,
        }))
    }

    /// 200 response carrying only a human-readable message
    #[must_use]
    pub fn message(text: &str) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "success": true,
            "message": text,
        }))
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    /// Add a cookie to the redirect response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add an error parameter to the redirect URL
    #[must_use]
    pub fn with_error(mut self, error_param: &str) -> Self {
        self.location = if self.location.contains('?') {
            format!("{}&error={error_param}", self.location)
        } else {
            format!("{}?error={error_param}", self.location)
        };
        self
    }

    /// Build the final redirect response
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();

        for cookie in self.cookies {
            builder.cookie(cookie);
        }

        builder.append_header(("Location", self.location)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_redirect_builder() {
        let response = ResponseBuilder::redirect("https://example.com").build();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_redirect_with_error_param() {
        let response = ResponseBuilder::redirect("https://example.com/login")
            .with_error("saml_auth_failed")
            .build();
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "https://example.com/login?error=saml_auth_failed"
        );

        let response = ResponseBuilder::redirect("https://example.com/login?foo=1")
            .with_error("saml_auth_failed")
            .build();
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "https://example.com/login?foo=1&error=saml_auth_failed"
        );
    }

    #[test]
    fn test_redirect_with_cookie() {
        let cookie = Cookie::new("sg_sso", "value");
        let response = ResponseBuilder::redirect("https://idp.example.com/sso")
            .with_cookie(cookie)
            .build();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get("Set-Cookie").is_some());
    }

    #[test]
    fn test_success_envelope() {
        let response = ResponseBuilder::success(&serde_json::json!([]));
        assert_eq!(response.status(), StatusCode::OK);

        let response = ResponseBuilder::created(&serde_json::json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ResponseBuilder::message("Provider deleted");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
