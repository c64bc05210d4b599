//! HTTP transport seam
//!
//! The client never talks to the network directly; it hands an
//! [`HttpRequest`] to an [`HttpTransport`]. [`ReqwestTransport`] is the
//! production implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// HTTP verbs used by the 8kit API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-resolved request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Value of the first header named `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path and query of the URL, without scheme and host
    pub fn path(&self) -> &str {
        let rest = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
    }
}

/// Status and decoded body of a response
///
/// Bodies that are not JSON are carried as a JSON string; an empty body is
/// `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("host not found: {0}")]
    HostNotFound(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}

/// Sends one HTTP request
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{} ({})", request.url, e)))?;

        let mut builder = self.client.request(method, url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(classify_reqwest_error)?;
        trace!(status, bytes = text.len(), "response received");

        Ok(HttpResponse::new(status, decode_body(&text)))
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_builder() {
        return TransportError::InvalidUrl(err.to_string());
    }

    let detail = error_chain(&err);
    if err.is_connect() {
        let lower = detail.to_lowercase();
        if lower.contains("dns") || lower.contains("lookup") || lower.contains("not known") {
            return TransportError::HostNotFound(detail);
        }
        return TransportError::ConnectionRefused(detail);
    }
    TransportError::Other(detail)
}

/// Join an error and its sources; reqwest hides the io cause otherwise.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![("X-Api-Key".to_string(), "k".to_string())],
            body: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_request_path() {
        assert_eq!(
            request("https://api.example.com/api/v1/sets/a?page=1").path(),
            "/api/v1/sets/a?page=1"
        );
        assert_eq!(request("http://localhost:3000").path(), "/");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        assert_eq!(request("http://h/").header("x-api-key"), Some("k"));
        assert_eq!(request("http://h/").header("content-type"), None);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("{\"success\":true}"), json!({"success": true}));
        assert_eq!(decode_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = ReqwestTransport::new()
            .send(request("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
