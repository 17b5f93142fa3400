//! HMAC-signed, time-limited object URLs

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Route prefix under which signed objects are served
pub const OBJECTS_ROUTE_PREFIX: &str = "/objects";

#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignatureError {
    #[error("signed url has expired")]
    Expired,
    #[error("signature does not match")]
    Invalid,
}

/// Signs `{path}:{expires}` with HMAC-SHA256
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Result<Self, DomainError> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(DomainError::configuration("object signing secret is empty"));
        }

        Ok(Self {
            secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn mac(&self, path: &str, expires: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(format!("{}:{}", path, expires).as_bytes());
        mac
    }

    pub fn signature(&self, path: &str, expires: i64) -> String {
        hex::encode(self.mac(path, expires).finalize().into_bytes())
    }

    pub fn sign(&self, path: &str, ttl: Duration) -> SignedUrl {
        self.sign_at(path, ttl, Utc::now())
    }

    pub fn sign_at(&self, path: &str, ttl: Duration, now: DateTime<Utc>) -> SignedUrl {
        let expires = now.timestamp().saturating_add(ttl.as_secs() as i64);
        let signature = self.signature(path, expires);

        SignedUrl {
            url: format!(
                "{}{}/{}?expires={}&signature={}",
                self.base_url, OBJECTS_ROUTE_PREFIX, path, expires, signature
            ),
            expires_at: Utc
                .timestamp_opt(expires, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn verify(&self, path: &str, expires: i64, signature: &str) -> Result<(), SignatureError> {
        self.verify_at(path, expires, signature, Utc::now())
    }

    pub fn verify_at(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;

        self.mac(path, expires)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if now.timestamp() >= expires {
            return Err(SignatureError::Expired);
        }

        Ok(())
    }
}
