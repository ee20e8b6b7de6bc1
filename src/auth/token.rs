//! HMAC-SHA256 signed session tokens.
//!
//! Tokens use the compact JWT layout, three base64url segments:
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(HMAC-SHA256(header "." claims))
//! ```
//!
//! The header must declare `HS256`. Claims carry the user id, an absolute
//! expiry (unix seconds) and a random token id so that two logins never
//! produce the same token. Nothing is stored server-side: a token is
//! valid until its expiry as long as the signing secret is unchanged.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{TokenIssuer, TokenValidator};
use crate::errors::{internal, KeepVaultError, Result};
use crate::vault::{AuthToken, UserId};

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<String>,
    exp: i64,
    #[serde(default)]
    jti: String,
}

/// Issues and validates tokens signed with a shared secret.
///
/// The expiry is fixed when the gate is built: every token issued by the
/// same gate expires at the same instant.
pub struct HmacTokenGate {
    secret: Zeroizing<Vec<u8>>,
    expires_at: DateTime<Utc>,
}

impl HmacTokenGate {
    pub fn new(secret: &[u8], expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
            expires_at,
        }
    }

    /// Build a gate whose tokens expire `ttl` from now.
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(secret, expires_at)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn mac(&self) -> Result<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.secret).map_err(internal("init token HMAC"))
    }

    fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
        let json = serde_json::to_vec(value).map_err(internal("encode token segment"))?;
        Ok(BASE64URL.encode(json))
    }

    fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
        let bytes = BASE64URL
            .decode(segment)
            .map_err(|_| KeepVaultError::InvalidToken)?;
        serde_json::from_slice(&bytes).map_err(|_| KeepVaultError::InvalidToken)
    }
}

impl TokenIssuer for HmacTokenGate {
    fn create_token(&self, user_id: &UserId) -> Result<AuthToken> {
        let mut jti = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut jti);

        let header = Self::encode_segment(&Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        })?;
        let claims = Self::encode_segment(&Claims {
            user_id: Some(user_id.0.clone()),
            exp: self.expires_at.timestamp(),
            jti: hex::encode(jti),
        })?;

        let signing_input = format!("{header}.{claims}");
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = BASE64URL.encode(mac.finalize().into_bytes());

        Ok(AuthToken(format!("{signing_input}.{signature}")))
    }
}

impl TokenValidator for HmacTokenGate {
    fn validate_token(&self, token: &AuthToken) -> Result<UserId> {
        let mut parts = token.as_str().split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(KeepVaultError::InvalidToken),
            };

        let header: Header = Self::decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            tracing::warn!(alg = %header.alg, "rejected token with unexpected algorithm");
            return Err(KeepVaultError::InvalidToken);
        }

        let signature = BASE64URL
            .decode(signature_b64)
            .map_err(|_| KeepVaultError::InvalidToken)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| KeepVaultError::InvalidToken)?;

        let claims: Claims = Self::decode_segment(claims_b64)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(KeepVaultError::InvalidToken);
        }

        match claims.user_id {
            Some(id) if !id.is_empty() => Ok(UserId(id)),
            _ => Err(KeepVaultError::InvalidToken),
        }
    }
}
