//! Backend API client for Order Pad.
//!
//! Provides authenticated HTTP communication with the restaurant backend,
//! used for connectivity testing, the menu catalog fetch, and the
//! order-for-table write.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used specifically for the lightweight connectivity test.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes of a backend request, mapped to operator-readable messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach order server at {url}")]
    Unreachable { url: String },
    #[error("Connection to {url} timed out")]
    Timeout { url: String },
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("Network error communicating with {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid JSON from order server: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Config(String),
}

/// Convert a `reqwest::Error` into the matching `ApiError` variant.
fn map_request_error(url: &str, err: reqwest::Error) -> ApiError {
    if err.is_connect() {
        return ApiError::Unreachable {
            url: url.to_string(),
        };
    }
    if err.is_timeout() {
        return ApiError::Timeout {
            url: url.to_string(),
        };
    }
    if err.is_builder() {
        return ApiError::Config(format!("Invalid order server URL: {url}"));
    }
    ApiError::Network {
        url: url.to_string(),
        source: err,
    }
}

/// Convert an HTTP status code into an operator-readable message.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Terminal not authorized".to_string(),
        404 => "Order server endpoint not found".to_string(),
        s if s >= 500 => format!("Order server error (HTTP {s})"),
        s => format!("Unexpected response from order server (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Server configuration
// ---------------------------------------------------------------------------

/// Normalise the order server URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_server_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    // Strip trailing slashes again (in case "/api/" was present)
    while url.ends_with('/') {
        url.pop();
    }

    url
}

fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('{') {
        return serde_json::from_str::<Value>(&compact).ok();
    }
    if compact.len() < 20 {
        return None;
    }

    let base64 = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        base64,
        "=".repeat((4usize.wrapping_sub(base64.len() % 4)) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

fn payload_field(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = payload.get(*key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Connection settings for one terminal, decoded from a connection string
/// handed out during provisioning.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_url: String,
    pub api_key: String,
    pub terminal_id: Option<String>,
}

impl ServerConfig {
    pub fn new(server_url: &str, api_key: &str) -> Self {
        ServerConfig {
            server_url: normalize_server_url(server_url),
            api_key: api_key.trim().to_string(),
            terminal_id: None,
        }
    }

    /// Decode a connection string: either plain JSON or URL-safe base64
    /// JSON carrying `url`, `key` and optionally `tid`.
    pub fn from_connection_string(raw: &str) -> Result<Self, ApiError> {
        let payload = decode_connection_string_payload(raw)
            .ok_or_else(|| ApiError::Config("Connection string is not valid".to_string()))?;

        let server_url = payload_field(&payload, &["url"])
            .map(|u| normalize_server_url(&u))
            .ok_or_else(|| {
                ApiError::Config("Connection string is missing the server URL".to_string())
            })?;
        let api_key = payload_field(&payload, &["key"]).ok_or_else(|| {
            ApiError::Config("Connection string is missing the API key".to_string())
        })?;
        let terminal_id = payload_field(&payload, &["tid", "terminalId"]);

        Ok(ServerConfig {
            server_url,
            api_key,
            terminal_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Connectivity test
// ---------------------------------------------------------------------------

/// Result of a connectivity test.
#[derive(serde::Serialize)]
pub struct ConnectivityResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Test connectivity to the order server with a lightweight health-check.
pub async fn test_connectivity(config: &ServerConfig) -> ConnectivityResult {
    let health_url = format!("{}/api/health", config.server_url);

    let client = match Client::builder().timeout(CONNECTIVITY_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            return ConnectivityResult {
                success: false,
                latency_ms: None,
                error: Some(format!("Failed to create HTTP client: {e}")),
            };
        }
    };

    let start = Instant::now();

    let resp = match client
        .get(&health_url)
        .header("X-POS-API-Key", &config.api_key)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return ConnectivityResult {
                success: false,
                latency_ms: None,
                error: Some(map_request_error(&config.server_url, e).to_string()),
            };
        }
    };

    let latency = start.elapsed().as_millis() as u64;
    let status = resp.status();

    if status.is_success() {
        info!(latency_ms = latency, "connectivity test passed");
        ConnectivityResult {
            success: true,
            latency_ms: Some(latency),
            error: None,
        }
    } else {
        ConnectivityResult {
            success: false,
            latency_ms: Some(latency),
            error: Some(status_message(status)),
        }
    }
}

// ---------------------------------------------------------------------------
// Authenticated client
// ---------------------------------------------------------------------------

/// Authenticated HTTP client for the order server. One instance is built
/// per terminal session and shared by the catalog fetch and order submit.
pub struct ApiClient {
    http: Client,
    config: ServerConfig,
}

impl ApiClient {
    pub fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(ApiClient { http, config })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Perform an authenticated HTTP request against the order server.
    ///
    /// `path` should include the leading slash, e.g. `/api/pos/menu`.
    /// Returns the JSON body, or `Value::Null` for empty 204 responses.
    pub async fn fetch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let full_url = format!("{}{}", self.config.server_url, path);

        let mut req = self
            .http
            .request(method, &full_url)
            .header("X-POS-API-Key", &self.config.api_key)
            .header("Content-Type", "application/json");
        if let Some(terminal_id) = &self.config.terminal_id {
            req = req.header("x-terminal-id", terminal_id);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| map_request_error(&self.config.server_url, e))?;
        let status = resp.status();

        if !status.is_success() {
            // Preserve validation details from the backend response body.
            let body_text = resp.text().await.unwrap_or_default();
            let message = if let Ok(json) = serde_json::from_str::<Value>(&body_text) {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| status_message(status))
            } else if !body_text.trim().is_empty() {
                format!("{}: {}", status_message(status), body_text.trim())
            } else {
                status_message(status)
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body_text = resp
            .text()
            .await
            .map_err(|e| map_request_error(&self.config.server_url, e))?;
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body_text)?)
    }
}
