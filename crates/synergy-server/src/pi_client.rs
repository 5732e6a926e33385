//! Client for the Pi Platform API.
//!
//! Covers the three calls the dashboard needs: resolving a user access
//! token, and approving and completing a payment with the app's server key.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors from the Pi Platform API.
#[derive(Debug, Error)]
pub enum PiError {
    /// Payment IDs go into the URL path, so only URL-safe IDs are sent
    #[error("Invalid payment ID: {0:?}")]
    InvalidPaymentId(String),

    /// The request never produced a usable response
    #[error("Pi API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Pi API returned status {status}")]
    Upstream { status: u16, details: Value },
}

/// A Pi user as returned by `/v2/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PiUser {
    pub uid: String,
    pub username: String,
}

/// Pi Platform API client.
#[derive(Debug, Clone)]
pub struct PiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PiClient {
    /// Create a client for `base_url` authenticating payments with `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a user access token to the user it belongs to.
    pub async fn me(&self, access_token: &str) -> Result<PiUser, PiError> {
        let resp = self
            .http
            .get(format!("{}/v2/me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Server-side approval of a payment the client created.
    pub async fn approve_payment(&self, payment_id: &str) -> Result<Map<String, Value>, PiError> {
        self.payment_action(payment_id, "approve", None).await
    }

    /// Server-side completion once the blockchain transaction is submitted.
    pub async fn complete_payment(
        &self,
        payment_id: &str,
        txid: &str,
    ) -> Result<Map<String, Value>, PiError> {
        self.payment_action(payment_id, "complete", Some(json!({ "txid": txid })))
            .await
    }

    async fn payment_action(
        &self,
        payment_id: &str,
        action: &str,
        body: Option<Value>,
    ) -> Result<Map<String, Value>, PiError> {
        if !is_url_safe_id(payment_id) {
            return Err(PiError::InvalidPaymentId(payment_id.to_string()));
        }

        let url = format!("{}/v2/payments/{}/{}", self.base_url, payment_id, action);
        let request = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.api_key));
        let request = match body {
            Some(body) => request.json(&body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let resp = check_status(request.send().await?).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, PiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    // Error bodies are passed through when they are JSON
    let details = resp.json::<Value>().await.unwrap_or_else(|_| json!({}));
    Err(PiError::Upstream {
        status: status.as_u16(),
        details,
    })
}

fn is_url_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
pub(crate) mod mock {
    //! A local stand-in for the Pi Platform API.

    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    pub const SERVER_KEY: &str = "test-server-key";
    pub const USER_TOKEN: &str = "good-token";

    async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        let expected = format!("Bearer {USER_TOKEN}");
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(auth) if auth == expected => Ok(Json(json!({
                "uid": "user-123",
                "username": "pioneer",
                "credentials": { "scopes": ["username", "payments"] }
            }))),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let expected = format!("Key {SERVER_KEY}");
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }

    async fn approve(
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_key" })));
        }
        if id == "missing" {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": "payment_not_found" })));
        }
        (
            StatusCode::OK,
            Json(json!({ "identifier": id, "amount": 1.5, "status": { "developer_approved": true } })),
        )
    }

    async fn complete(
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_key" })));
        }
        (
            StatusCode::OK,
            Json(json!({
                "identifier": id,
                "transaction": { "txid": body["txid"] },
                "status": { "developer_completed": true }
            })),
        )
    }

    /// A Pi client for `base_url` that ignores proxy settings.
    pub fn client(base_url: &str, api_key: &str) -> super::PiClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        super::PiClient::with_http_client(http, base_url, api_key)
    }

    /// Serve the mock on an ephemeral local port and return its base URL.
    pub async fn spawn() -> String {
        let app = Router::new()
            .route("/v2/me", get(me))
            .route("/v2/payments/{id}/approve", post(approve))
            .route("/v2/payments/{id}/complete", post(complete));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}
