//! Access token minting and verification
//!
//! After identity resolution the gateway mints a short-lived HS256 token
//! the frontend exchanges on its own `/auth/callback` page. The same
//! verifier gates the admin API: a bearer token whose `role` claim is
//! `admin`.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::models::{User, UserRole};
use crate::utils::crypto::{create_jwt_hs256, verify_jwt_hs256};

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is invalid: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error("failed to mint token: {0}")]
    Minting(String),
}

/// Claims carried by a minted access token
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies the gateway's access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    issuer: String,
    ttl_minutes: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, issuer: &str, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            issuer: issuer.to_string(),
            ttl_minutes,
        }
    }

    /// Mint an access token for a resolved user
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Minting` if serialization or signing fails
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.ttl_minutes);

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "name": user.display_name,
            "iss": self.issuer,
            "iat": now.timestamp(),
            "exp": exp.timestamp(),
        });

        create_jwt_hs256(&payload, &self.secret).map_err(|e| TokenError::Minting(e.to_string()))
    }

    /// Verify a token's signature and expiry and return its claims
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` on structural or signature failure and
    /// `TokenError::Expired` when `exp` has passed
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let payload =
            verify_jwt_hs256(token, &self.secret).map_err(|e| TokenError::Invalid(e.to_string()))?;

        let claims: Claims = serde_json::from_value(payload)
            .map_err(|e| TokenError::Invalid(format!("bad claims: {e}")))?;

        if claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
