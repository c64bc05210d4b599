//! Resilient API client
//!
//! Wraps one logical request with a per-attempt timeout and a bounded,
//! fixed-delay retry. Transport failures, 429 and 5xx are retried; any
//! other non-2xx status is returned at once as [`Error::Api`].
//!
//! A 2xx answer is handed back as an [`ApiResponse`] even when its body
//! says `success: false`. Callers decide what that means.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use eightkit_core::config::mask_secret;
use eightkit_core::{ApiResponse, ClientConfig, Error, Result};

use crate::credentials::CredentialProvider;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Error::Timeout,
            TransportError::HostNotFound(_) => {
                Error::HostUnreachable("Host not found - check your Host URL configuration".to_string())
            }
            TransportError::ConnectionRefused(_) => {
                Error::HostUnreachable("Connection refused - check if the server is running".to_string())
            }
            TransportError::InvalidUrl(url) => Error::InvalidUrl(url),
            TransportError::Other(msg) => Error::Network(msg),
        }
    }
}

/// Client for the 8kit REST API
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Same transport and credentials, different tuning
    pub fn with_config(&self, config: ClientConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Delete, path, None).await
    }

    /// Perform `method path` with up to `max_retries + 1` attempts.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(method, path, body.as_ref(), attempt).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        %method,
                        path,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Request failed, retrying in {}ms",
                        self.config.retry_delay_ms
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => {
                    debug!(%method, path, attempt, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<ApiResponse> {
        let credentials = self.credentials.credentials().await?;
        let url = format!("{}{}", credentials.base_url()?, path);

        if credentials.api_key.is_empty() {
            warn!(%url, "API key is empty");
        }
        debug!(
            %method,
            %url,
            attempt,
            api_key = %mask_secret(&credentials.api_key),
            "Sending request"
        );

        let request = HttpRequest {
            method,
            url,
            headers: vec![
                (API_KEY_HEADER.to_string(), credentials.api_key),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: body.cloned(),
            timeout: self.config.timeout(),
        };

        let response = match tokio::time::timeout(self.config.timeout(), self.transport.send(request)).await {
            Err(_) => return Err(Error::Timeout),
            Ok(result) => result?,
        };

        debug!(%method, path, status = response.status, "Response received");
        into_api_response(response)
    }
}

fn into_api_response(response: HttpResponse) -> Result<ApiResponse> {
    if !response.is_success() {
        return Err(api_error(response));
    }

    let is_envelope = response
        .body
        .get("success")
        .map_or(false, Value::is_boolean);
    if is_envelope {
        return Ok(serde_json::from_value(response.body)?);
    }

    let data = match response.body {
        Value::Null => None,
        other => Some(other),
    };
    Ok(ApiResponse {
        success: true,
        data,
        error: None,
        code: None,
        details: None,
    })
}

fn api_error(response: HttpResponse) -> Error {
    let body = &response.body;
    let message = body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.as_str().filter(|s| !s.is_empty()))
        .unwrap_or("Unknown error")
        .to_string();
    let code = body
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();

    Error::Api {
        status: response.status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failure, ok, MockReply, MockTransport};
    use eightkit_core::Credentials;
    use serde_json::json;

    const PATH: &str = "/api/v1/sets/orders";

    fn client(mock: &Arc<MockTransport>, config: ClientConfig) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("https://api.example.com/", "st_secret_key")),
            config,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_max_retries_failures() {
        let mock = Arc::new(MockTransport::new());
        for _ in 0..3 {
            mock.fail(HttpMethod::Get, PATH, TransportError::Other("reset".into()));
        }
        mock.reply(HttpMethod::Get, PATH, 200, ok(json!({"name": "orders"})));

        let response = client(&mock, ClientConfig::default()).get(PATH).await.unwrap();
        assert!(response.success);
        assert_eq!(mock.count(HttpMethod::Get, PATH), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(HttpMethod::Get, PATH, TransportError::Timeout);

        let config = ClientConfig::default().with_max_retries(2);
        let err = client(&mock, config).get(PATH).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(mock.count(HttpMethod::Get, PATH), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, PATH, 404, failure("SET_NOT_FOUND", "Set not found"));

        let err = client(&mock, ClientConfig::default()).get(PATH).await.unwrap_err();
        assert_eq!(err.to_string(), "API Error (404): Set not found - Code: SET_NOT_FOUND");
        assert_eq!(mock.count(HttpMethod::Get, PATH), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_and_server_errors_are_retried() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, PATH, 429, json!({"error": "slow down"}))
            .reply(HttpMethod::Post, PATH, 502, Value::Null)
            .reply(HttpMethod::Post, PATH, 201, ok(json!({"id": 1})));

        let response = client(&mock, ClientConfig::default())
            .post(PATH, json!({"value": "a"}))
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"id": 1})));
        assert_eq!(mock.count(HttpMethod::Post, PATH), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_fixed_delay() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(HttpMethod::Get, PATH, TransportError::Other("reset".into()))
            .reply(HttpMethod::Get, PATH, 200, ok(json!(null)));

        let start = tokio::time::Instant::now();
        let config = ClientConfig::default().with_retry_delay_ms(250);
        client(&mock, config).get(PATH).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(250));
        assert!(elapsed < std::time::Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transport_times_out_per_attempt() {
        let mock = Arc::new(MockTransport::new());
        mock.push(HttpMethod::Get, PATH, MockReply::Stall);

        let config = ClientConfig::default()
            .with_timeout_ms(5000)
            .with_max_retries(1);
        let err = client(&mock, config).get(PATH).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(mock.count(HttpMethod::Get, PATH), 2);
    }

    #[tokio::test]
    async fn test_success_false_is_returned_not_raised() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, PATH, 200, failure("SET_NOT_FOUND", "Set not found"));

        let response = client(&mock, ClientConfig::default()).get(PATH).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("SET_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_request_carries_key_and_json_body() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, PATH, 200, ok(json!({})));

        client(&mock, ClientConfig::default())
            .post(PATH, json!({"value": "v"}))
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.url, "https://api.example.com/api/v1/sets/orders");
        assert_eq!(sent.header("x-api-key"), Some("st_secret_key"));
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.body, Some(json!({"value": "v"})));
    }

    #[tokio::test]
    async fn test_missing_host_url_fails_without_request() {
        let mock = Arc::new(MockTransport::new());
        let client = ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("", "key")),
            ClientConfig::default(),
        );

        let err = client.get(PATH).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_transport_error_messages() {
        assert_eq!(
            Error::from(TransportError::HostNotFound("dns".into())).to_string(),
            "Host not found - check your Host URL configuration"
        );
        assert_eq!(
            Error::from(TransportError::ConnectionRefused("io".into())).to_string(),
            "Connection refused - check if the server is running"
        );
        assert_eq!(
            Error::from(TransportError::Timeout).to_string(),
            "Request timeout - the server took too long to respond"
        );
    }

    #[test]
    fn test_api_error_defaults() {
        let err = api_error(HttpResponse::new(500, Value::Null));
        assert_eq!(err.to_string(), "API Error (500): Unknown error - Code: UNKNOWN");
    }
}
