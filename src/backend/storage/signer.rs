/**
 * Download Token Signing
 *
 * Presigned references issued by the in-process backend are HS256 JWTs.
 * Each token names exactly one storage key, carries its own expiry, and is
 * verified before any bytes are served.
 */

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scope carried by every download token
pub const DOWNLOAD_SCOPE: &str = "object:read";

/// Claims of a download token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadClaims {
    /// Storage key the token grants access to
    pub sub: String,
    pub scope: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Token id
    pub jti: String,
}

/// Signs and verifies download tokens with a shared secret
#[derive(Clone)]
pub struct DownloadSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for DownloadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSigner").finish_non_exhaustive()
    }
}

impl DownloadSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for `key` valid for `ttl`
    pub fn sign(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp().max(0) as u64;
        let exp = now + ttl.as_secs().max(1);

        let claims = DownloadClaims {
            sub: key.to_string(),
            scope: DOWNLOAD_SCOPE.to_string(),
            exp,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        let expires_at = Utc
            .timestamp_opt(exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Ok((token, expires_at))
    }

    /// Verify signature, expiry and scope
    pub fn verify(&self, token: &str) -> Result<DownloadClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<DownloadClaims>(token, &self.decoding, &validation)?;
        if token_data.claims.scope != DOWNLOAD_SCOPE {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(token_data.claims)
    }
}
