//! Bridge to the Triumph partner app.
//!
//! Outbound calls carry the shared secret plus an HMAC-SHA256 signature of
//! the exact body bytes sent. Inbound calls must present the same shared
//! secret, and a signature when they send one.

use hmac::{digest::KeyInit, Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the shared secret.
pub const SHARED_SECRET_HEADER: &str = "x-shared-secret";

/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Path on the partner app that receives our calls.
pub const PARTNER_INBOX_PATH: &str = "/api/from-stem";

/// Errors from talking to the partner app.
#[derive(Debug, Error)]
pub enum PartnerError {
    #[error("Signing key rejected: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),

    #[error("Payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request never produced a usable response
    #[error("Partner request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The partner answered with a non-success status
    #[error("Partner returned status {0}")]
    Upstream(u16),
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, PartnerError> {
    Ok(<HmacSha256 as KeyInit>::new_from_slice(secret.as_bytes())?)
}

/// Hex HMAC-SHA256 of `payload` under `secret`.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, PartnerError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature of `payload` in constant time.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    match keyed_mac(secret) {
        Ok(mut mac) => {
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
        Err(_) => false,
    }
}

/// Compare a presented shared secret against the configured one without
/// short-circuiting on the first differing byte.
pub fn shared_secret_matches(configured: &str, presented: &str) -> bool {
    let (Ok(mut expected), Ok(mut actual)) = (keyed_mac(configured), keyed_mac(configured)) else {
        return false;
    };
    expected.update(configured.as_bytes());
    actual.update(presented.as_bytes());
    actual.verify_slice(&expected.finalize().into_bytes()).is_ok()
}

/// Client for the partner app.
#[derive(Debug, Clone)]
pub struct PartnerClient {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

impl PartnerClient {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, secret)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward `body` to the partner and return its JSON reply.
    pub async fn send(&self, body: &Value) -> Result<Value, PartnerError> {
        let payload = serde_json::to_vec(body)?;
        let signature = sign_payload(&self.secret, &payload)?;

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, PARTNER_INBOX_PATH))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SHARED_SECRET_HEADER, &self.secret)
            .header(SIGNATURE_HEADER, signature)
            .body(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PartnerError::Upstream(status.as_u16()));
        }
        Ok(resp.json().await?)
    }
}
