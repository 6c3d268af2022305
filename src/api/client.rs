// bluemoon-rbac/src/api/client.rs
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

const SNIPPET_LEN: usize = 100;
const LOG_SNIPPET_LEN: usize = 200;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Non-2xx response.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// The body said `success: false`.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid JSON response from server: {0}")]
    InvalidJson(String),
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::InvalidJson(_) | ApiError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Delete => "DELETE",
        }
    }

    /// Only POST and PUT send a JSON body.
    pub fn carries_body(&self) -> bool {
        matches!(self, ApiMethod::Post | ApiMethod::Put)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub url: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }
}

/// Moves one request over the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let method = match request.method {
            ApiMethod::Get => reqwest::Method::GET,
            ApiMethod::Post => reqwest::Method::POST,
            ApiMethod::Put => reqwest::Method::PUT,
            ApiMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(RawResponse { status, content_type, body })
    }
}

fn snippet(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Turn a raw response into the JSON result callers see.
///
/// Error bodies yield their `message`/`details`/`errorCode`; successful
/// non-JSON bodies are wrapped as `{success: true, data}`; any body carrying
/// `success: false` is a failure whatever the status.
pub fn normalize_response(endpoint: &str, raw: RawResponse) -> Result<Value, ApiError> {
    let status = raw.status;

    if !raw.is_success() {
        if raw.is_json() && !raw.body.is_empty() {
            if let Ok(parsed) = serde_json::from_str::<Value>(&raw.body) {
                let message = first_text(&parsed, &["message", "details", "errorCode"])
                    .unwrap_or_else(|| format!("HTTP {}", status));
                error!("HTTP {} from {}: {}", status, endpoint, message);
                return Err(ApiError::Http { status, message });
            }
            error!("error response not JSON from {}: {}", endpoint, snippet(&raw.body, LOG_SNIPPET_LEN));
        } else {
            error!("HTTP {} non-JSON error from {}: {}", status, endpoint, snippet(&raw.body, LOG_SNIPPET_LEN));
        }
        let text = snippet(&raw.body, SNIPPET_LEN);
        let text = if text.is_empty() { "Unknown error".to_string() } else { text };
        return Err(ApiError::Http {
            status,
            message: format!("Server error ({}): {}", status, text),
        });
    }

    let result = if raw.is_json() && !raw.body.is_empty() {
        serde_json::from_str::<Value>(&raw.body).map_err(|e| {
            error!("JSON parse error for {}: {}", endpoint, e);
            ApiError::InvalidJson(snippet(&raw.body, SNIPPET_LEN))
        })?
    } else if !raw.body.is_empty() {
        warn!("non-JSON response from {}: {}", endpoint, snippet(&raw.body, LOG_SNIPPET_LEN));
        json!({ "success": true, "data": raw.body })
    } else {
        json!({ "success": true, "data": null })
    };

    if result.get("success") == Some(&Value::Bool(false)) {
        let message = first_text(&result, &["message", "details"])
            .unwrap_or_else(|| "Request failed".to_string());
        error!("request failed for {}: {}", endpoint, message);
        return Err(ApiError::Rejected { status, message });
    }

    Ok(result)
}

/// Client for the upstream JSON API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            bearer: None,
        }
    }

    pub fn with_reqwest(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self::new(base_url, Arc::new(ReqwestTransport::new(timeout)?)))
    }

    /// Same client, authenticating as the holder of `token`.
    pub fn with_bearer(&self, token: Option<String>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            transport: Arc::clone(&self.transport),
            bearer: token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn request(
        &self,
        endpoint: &str,
        method: ApiMethod,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let body = body.filter(|_| method.carries_body());
        if let Some(payload) = &body {
            debug!("{} {}: {}", method.as_str(), endpoint, payload);
        }

        let request = ApiRequest {
            method,
            url: format!("{}{}", self.base_url, endpoint),
            body,
            bearer: self.bearer.clone(),
        };
        let raw = self.transport.send(request).await?;
        normalize_response(endpoint, raw)
    }
}
