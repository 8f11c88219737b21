use actix_web::cookie::Cookie;
use actix_web::HttpResponse;

pub struct ErrorHandler;

impl ErrorHandler {
    /// Redirect a failed SSO callback to the frontend login page with a
    /// coarse reason code, clearing the login-state cookie
    ///
    /// The browser is mid-navigation at this point, so the failure is never
    /// surfaced as structured JSON and the reason code never carries
    /// verifier detail.
    pub fn sso_error_redirect(
        login_url: &str,
        error_code: &str,
        clear_cookie: Cookie<'static>,
    ) -> HttpResponse {
        let final_url = if login_url.contains('?') {
            format!("{login_url}&error={error_code}")
        } else {
            format!("{login_url}?error={error_code}")
        };

        HttpResponse::Found()
            .cookie(clear_cookie)
            .append_header(("Location", final_url))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::cookies::create_expired_state_cookie;
    use actix_web::http::StatusCode;

    #[test]
    fn test_sso_error_redirect_shape() {
        let response = ErrorHandler::sso_error_redirect(
            "http://localhost:3000/login",
            "saml_auth_failed",
            create_expired_state_cookie(false),
        );

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "http://localhost:3000/login?error=saml_auth_failed"
        );
        assert!(response.headers().get("Set-Cookie").is_some());
    }
}
