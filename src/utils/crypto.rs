// Cryptographic utilities for state tokens, cookie encryption and JWT minting

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Generate a high-entropy relay-state token
///
/// 24 bytes (192 bits) of entropy, base64url-encoded to 32 characters.
/// Used as the SAML `RelayState` parameter on login initiation.
#[must_use]
pub fn generate_relay_token() -> String {
    let mut nonce = [0u8; 24]; // 192 bits of entropy
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let json_data = serde_json::to_string(data).context("Failed to serialize data")?;

    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_bytes())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    // Combine nonce + ciphertext and encode as base64
    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    let data: T = serde_json::from_slice(&plaintext)
        .context("Failed to deserialize data from decrypted JSON")?;

    Ok(data)
}

/// Derive a proper 32-byte encryption key from input key material
///
/// Ensures that any input key is properly extended or truncated to exactly
/// 32 bytes for use with AES-256.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    let key_len = std::cmp::min(input_key.len(), ENCRYPTION_KEY_SIZE);
    encryption_key[..key_len].copy_from_slice(&input_key[..key_len]);

    // If key is shorter than 32 bytes, derive the rest using a simple hash
    if key_len < ENCRYPTION_KEY_SIZE && key_len > 0 {
        for i in key_len..ENCRYPTION_KEY_SIZE {
            encryption_key[i] =
                encryption_key[i % key_len].wrapping_add(u8::try_from(i % 256).unwrap_or(0));
        }
    }

    encryption_key
}

/// Create a signed HS256 JWT from the given claims
///
/// # Errors
///
/// Returns an error if:
/// - JSON serialization fails
/// - Signing fails
pub fn create_jwt_hs256(payload: &serde_json::Value, secret: &[u8]) -> Result<String> {
    let header = serde_json::json!({
        "alg": "HS256",
        "typ": "JWT"
    });

    let header_json = serde_json::to_string(&header).context("Failed to serialize JWT header")?;
    let payload_json =
        serde_json::to_string(payload).context("Failed to serialize JWT payload")?;

    let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header_json.as_bytes());
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload_json.as_bytes());

    let message = format!("{header_b64}.{payload_b64}");
    let signature = sign_hmac_sha256(message.as_bytes(), secret)?;
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(&signature);

    Ok(format!("{message}.{signature_b64}"))
}

/// Verify an HS256 JWT signature and return the decoded claims
///
/// Expiry and claim semantics are the caller's concern; this only checks
/// structure and signature.
///
/// # Errors
///
/// Returns an error if:
/// - The token does not have three dot-separated parts
/// - The signature does not match
/// - The payload is not valid base64url-encoded JSON
pub fn verify_jwt_hs256(token: &str, secret: &[u8]) -> Result<serde_json::Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(anyhow!("Invalid JWT format"));
    }

    let message = format!("{}.{}", parts[0], parts[1]);
    let provided = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[2])
        .context("Failed to decode JWT signature")?;

    // HMAC verification via the Mac trait is constant-time
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(secret).map_err(|_| anyhow!("Invalid HMAC key length"))?;
    mac.update(message.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| anyhow!("JWT signature mismatch"))?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .context("Failed to decode JWT payload")?;
    serde_json::from_slice(&payload_bytes).context("Failed to parse JWT payload")
}

/// Sign a message using HMAC-SHA256
///
/// # Errors
///
/// Returns an error if HMAC computation fails
fn sign_hmac_sha256(message: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| anyhow!("Invalid HMAC key length"))?;
    mac.update(message);

    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_SECRET: &[u8] = b"test_secret_key_for_hmac_testing_32b";

    #[test]
    fn test_relay_token_uniqueness() {
        let token1 = generate_relay_token();
        let token2 = generate_relay_token();

        assert_eq!(token1.len(), 32);
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = derive_encryption_key(b"some-session-secret");
        let data = json!({"provider_id": "abc", "relay_state": "xyz"});

        let encrypted = encrypt_data(&data, &key).unwrap();
        let decrypted: serde_json::Value = decrypt_data(&encrypted, &key).unwrap();

        assert_eq!(decrypted, data);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let key = derive_encryption_key(b"secret-one");
        let other_key = derive_encryption_key(b"secret-two");
        let data = json!({"x": 1});

        let encrypted = encrypt_data(&data, &key).unwrap();
        assert!(decrypt_data::<serde_json::Value>(&encrypted, &other_key).is_err());
    }

    #[test]
    fn test_encrypt_rejects_bad_key_length() {
        let data = json!({"x": 1});
        assert!(encrypt_data(&data, b"short").is_err());
    }

    #[test]
    fn test_create_jwt_structure() {
        let payload = json!({
            "sub": "user-1",
            "iat": 1_234_567_890,
            "exp": 1_234_571_490
        });

        let jwt = create_jwt_hs256(&payload, TEST_SECRET).unwrap();
        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header_bytes = general_purpose::URL_SAFE_NO_PAD.decode(parts[0]).unwrap();
        let decoded_header: serde_json::Value = serde_json::from_slice(&header_bytes).unwrap();
        assert_eq!(decoded_header["alg"], "HS256");
        assert_eq!(decoded_header["typ"], "JWT");
    }

    #[test]
    fn test_verify_jwt_round_trip() {
        let payload = json!({"sub": "user-1", "role": "admin"});
        let jwt = create_jwt_hs256(&payload, TEST_SECRET).unwrap();

        let claims = verify_jwt_hs256(&jwt, TEST_SECRET).unwrap();
        assert_eq!(claims["sub"], "user-1");
        assert_eq!(claims["role"], "admin");
    }

    #[test]
    fn test_verify_jwt_rejects_wrong_secret() {
        let payload = json!({"sub": "user-1"});
        let jwt = create_jwt_hs256(&payload, TEST_SECRET).unwrap();

        assert!(verify_jwt_hs256(&jwt, b"a_completely_different_secret_32").is_err());
    }

    #[test]
    fn test_verify_jwt_rejects_tampered_payload() {
        let payload = json!({"sub": "user-1", "role": "client"});
        let jwt = create_jwt_hs256(&payload, TEST_SECRET).unwrap();
        let parts: Vec<&str> = jwt.split('.').collect();

        let forged_payload = general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&json!({"sub": "user-1", "role": "admin"})).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(verify_jwt_hs256(&forged, TEST_SECRET).is_err());
    }

    #[test]
    fn test_verify_jwt_rejects_garbage() {
        assert!(verify_jwt_hs256("not-a-jwt", TEST_SECRET).is_err());
        assert!(verify_jwt_hs256("a.b", TEST_SECRET).is_err());
    }
}
