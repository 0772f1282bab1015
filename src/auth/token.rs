//! Signed token codec
//!
//! Both token kinds use the same format:
//! `base64url(payload).base64url(hmac_sha256(payload))`
//! with independent signing secrets per kind, so an access token can
//! never pass refresh verification or vice versa.
//!
//! Access tokens are stateless: verification needs no store lookup
//! beyond resolving the referenced user. Refresh tokens are
//! additionally compared against the value stored on the user record
//! (single-use, rotated on every refresh).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which credential a token represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token payload
///
/// Carries the actor id and expiry; the nonce makes every issued
/// refresh token byte-distinct so rotation comparison is meaningful
/// even within one clock second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Actor (user) ID
    pub sub: String,
    pub kind: TokenKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Random per-token value
    pub nonce: u64,
}

impl TokenClaims {
    /// Build claims for an actor with the given kind and lifetime
    pub fn new(actor_id: &str, kind: TokenKind, ttl_seconds: i64) -> Self {
        use rand::Rng;

        let now = Utc::now();
        Self {
            sub: actor_id.to_string(),
            kind,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            nonce: rand::thread_rng().gen(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed token
///
/// # Arguments
/// * `claims` - Token payload to encode
/// * `secret` - HMAC secret key for this token kind
///
/// # Returns
/// Signed token string
pub fn create_token(claims: &TokenClaims, secret: &str) -> Result<String, AppError> {
    use base64::{engine::general_purpose, Engine as _};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize claims to JSON
    let payload = serde_json::to_string(claims).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a token
///
/// # Arguments
/// * `token` - Token string to verify
/// * `secret` - HMAC secret key for the expected kind
/// * `expected_kind` - Kind the caller requires
///
/// # Errors
/// `Unauthorized` if the token is malformed, has a bad signature,
/// carries the wrong kind, or is expired.
pub fn verify_token(
    token: &str,
    secret: &str,
    expected_kind: TokenKind,
) -> Result<TokenClaims, AppError> {
    use base64::{engine::general_purpose, Engine as _};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return Err(AppError::invalid_token());
    };

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::invalid_token())?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::invalid_token())?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::invalid_token())?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| AppError::invalid_token())?;

    let claims: TokenClaims =
        serde_json::from_str(&payload_str).map_err(|_| AppError::invalid_token())?;

    // 4. Reject cross-kind use and expired tokens
    if claims.kind != expected_kind || claims.is_expired() {
        return Err(AppError::invalid_token());
    }

    Ok(claims)
}
