//! HTTP utilities for Labstep REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::fmt;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header Labstep reads the API key from
const API_KEY_HEADER: &str = "apikey";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Non-success HTTP status returned by the API
///
/// Carried inside `anyhow::Error` so callers can `downcast_ref` it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiStatusError {
    pub status: StatusCode,
}

impl fmt::Display for ApiStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API request failed: {}", self.status)
    }
}

impl std::error::Error for ApiStatusError {}

/// Status code of a failed API call, if the error came from one
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiStatusError>())
        .map(|e| e.status)
}

/// HTTP client wrapper for Labstep API calls
#[derive(Clone)]
pub struct LabHttpClient {
    client: Client,
}

impl LabHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("labdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, api_key: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        let request = self.client.get(url).header(API_KEY_HEADER, api_key);
        self.send(request).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post(&self, url: &str, api_key: &str, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).header(API_KEY_HEADER, api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.send(request).await
    }

    /// Make a PUT request with an optional JSON body
    pub async fn put(&self, url: &str, api_key: &str, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("PUT {}", url);

        let mut request = self.client.put(url).header(API_KEY_HEADER, api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiStatusError { status }.into());
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Append URL-encoded query parameters
pub fn add_query_params(url: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// Format a Labstep API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    if let Some(status) = api_status(error) {
        return match status.as_u16() {
            401 => "Authentication failed. Check your Labstep email and API key.".to_string(),
            403 => "Permission denied. Check your workspace permissions.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The resource may already exist.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 | 422 => "Invalid request. Check your parameters.".to_string(),
            500..=599 => "Labstep service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    let error_str = error.to_string();

    // Truncate long error messages and remove potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| !c.is_control())
        .take(80)
        .collect::<String>();

    if error_str.chars().filter(|c| !c.is_control()).count() > 80 {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
