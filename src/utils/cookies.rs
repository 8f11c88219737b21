//! Encrypted login-state cookie
//!
//! Carries the ephemeral [`SsoState`] between login initiation and the
//! assertion callback. The cookie is correlation only — the callback never
//! requires it, since the IdP may POST from a browser context that dropped
//! it (third-party cookie policies, cross-site `SameSite` rules).

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;

use crate::models::SsoState;
use crate::utils::crypto::{decrypt_data, encrypt_data};

/// Name of the encrypted login-state cookie
pub const SSO_STATE_COOKIE: &str = "sg_sso_state";

/// Login states older than this are ignored at the callback
const STATE_MAX_AGE_MINUTES: i64 = 10;

/// Create the encrypted login-state cookie set on login initiation
///
/// `SameSite=None` because the IdP completes the flow with a cross-site
/// form POST to the callback endpoint.
///
/// # Errors
///
/// Returns an error if encryption fails
pub fn create_state_cookie(
    state: &SsoState,
    encryption_key: &[u8],
    secure: bool,
) -> Result<Cookie<'static>> {
    let value = encrypt_data(state, encryption_key)?;

    Ok(Cookie::build(SSO_STATE_COOKIE, value)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/saml")
        .max_age(Duration::minutes(STATE_MAX_AGE_MINUTES))
        .finish())
}

/// Expired cookie that clears the login state after the callback
#[must_use]
pub fn create_expired_state_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build(SSO_STATE_COOKIE, "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/saml")
        .max_age(Duration::seconds(0))
        .finish()
}

/// Read and decrypt the login state from the request, if present and fresh
///
/// Absent, undecryptable or stale cookies all yield `None`; the callback
/// treats every one of those the same way.
#[must_use]
pub fn get_state_from_request(req: &HttpRequest, encryption_key: &[u8]) -> Option<SsoState> {
    let cookie = req.cookie(SSO_STATE_COOKIE)?;
    let state: SsoState = match decrypt_data(cookie.value(), encryption_key) {
        Ok(state) => state,
        Err(e) => {
            log::debug!("Ignoring undecryptable login-state cookie: {e}");
            return None;
        }
    };

    let age = chrono::Utc::now() - state.created_at;
    if age > chrono::Duration::minutes(STATE_MAX_AGE_MINUTES) {
        log::debug!(
            "Ignoring stale login-state cookie for provider {}",
            state.provider_id
        );
        return None;
    }

    Some(state)
}
