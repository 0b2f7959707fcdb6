use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq)]
pub enum JwtError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid signature encoding")]
    InvalidSignatureEncoding,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),
}

/// Signs `header` and `claims` as a compact HS256 JWT.
pub fn sign_hs256<H, C>(header: &H, claims: &C, secret: &str) -> Result<String, JwtError>
where
    H: Serialize,
    C: Serialize,
{
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let header_json = serde_json::to_vec(header).map_err(|e| JwtError::InvalidClaims(e.to_string()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| JwtError::InvalidClaims(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| JwtError::MissingSecret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Verifies an HS256 signature and decodes the claims segment.
/// Expiry is left to the caller since claim shapes differ between issuers.
pub fn verify_hs256<C>(token: &str, secret: &str) -> Result<C, JwtError>
where
    C: DeserializeOwned,
{
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::InvalidFormat);
    }

    let signature = URL_SAFE_NO_PAD.decode(parts[2]).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        JwtError::InvalidSignatureEncoding
    })?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| JwtError::MissingSecret)?;
    mac.update(format!("{}.{}", parts[0], parts[1]).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(JwtError::InvalidSignature);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| JwtError::InvalidClaims(e.to_string()))?;

    serde_json::from_slice(&claims_bytes).map_err(|e| JwtError::InvalidClaims(e.to_string()))
}
