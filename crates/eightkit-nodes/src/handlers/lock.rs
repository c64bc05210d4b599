//! Distributed locks
//!
//! The remote service owns mutual exclusion. Nothing here waits for a
//! lock: an acquire that loses simply reports what the API said.

use serde_json::{json, Value};
use tracing::info;

use eightkit_client::ApiClient;
use eightkit_core::endpoint::lock_endpoint;
use eightkit_core::validation::validate_key;
use eightkit_core::Result;

/// Acquire `key`, optionally naming the caller and a hold time in milliseconds.
pub async fn acquire(
    client: &ApiClient,
    key: &str,
    calling_fn: Option<&str>,
    timeout_ms: Option<u64>,
) -> Result<Value> {
    validate_key(key)?;

    let mut body = json!({ "key": key });
    if let Some(calling_fn) = calling_fn {
        body["callingFn"] = Value::from(calling_fn);
    }
    if let Some(timeout) = timeout_ms {
        body["timeout"] = Value::from(timeout);
    }

    let lock = client
        .post(&lock_endpoint(None), body)
        .await?
        .into_value("acquire lock")?;
    info!(key, "Lock acquired");
    Ok(lock)
}

pub async fn check(client: &ApiClient, key: &str) -> Result<Value> {
    validate_key(key)?;
    client.get(&lock_endpoint(Some(key))).await?.into_value("check lock")
}

pub async fn release(client: &ApiClient, key: &str) -> Result<Value> {
    validate_key(key)?;

    let released = client
        .delete(&lock_endpoint(Some(key)))
        .await?
        .into_value("release lock")?;
    info!(key, "Lock released");
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eightkit_client::testing::{failure, ok, MockTransport};
    use eightkit_client::HttpMethod;
    use eightkit_core::{ClientConfig, Credentials, Error};
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("http://localhost:3000", "key")),
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_acquire_body() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, "/api/v1/locks", 201, ok(json!({"key": "job", "acquired": true})));

        let lock = acquire(&client(&mock), "job", Some("nightly-sync"), Some(5000))
            .await
            .unwrap();
        assert_eq!(lock["acquired"], json!(true));
        assert_eq!(
            mock.requests()[0].body,
            Some(json!({"key": "job", "callingFn": "nightly-sync", "timeout": 5000}))
        );
    }

    #[tokio::test]
    async fn test_acquire_held_lock_is_rejected() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, "/api/v1/locks", 200, failure("LOCK_HELD", "Lock is already held"));

        let err = acquire(&client(&mock), "job", None, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to acquire lock: Lock is already held");
        assert_eq!(mock.requests()[0].body, Some(json!({"key": "job"})));
    }

    #[tokio::test]
    async fn test_check_and_release_encode_key() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/locks/a%20b", 200, ok(json!({"locked": false})));
        mock.reply(HttpMethod::Delete, "/api/v1/locks/a%20b", 200, ok(json!({"released": true})));

        let status = check(&client(&mock), "a b").await.unwrap();
        assert_eq!(status, json!({"locked": false}));
        let released = release(&client(&mock), "a b").await.unwrap();
        assert_eq!(released, json!({"released": true}));
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_locally() {
        let mock = Arc::new(MockTransport::new());
        let err = release(&client(&mock), "  ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(mock.requests().is_empty());
    }
}
