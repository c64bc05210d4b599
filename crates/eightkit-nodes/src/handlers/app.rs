//! Application info and health

use serde_json::Value;

use eightkit_client::ApiClient;
use eightkit_core::endpoint::app_endpoint;
use eightkit_core::Result;

/// The app the API key belongs to
pub async fn info(client: &ApiClient) -> Result<Value> {
    client.get(&app_endpoint(Some("me"))).await?.into_value("get app info")
}

pub async fn health(client: &ApiClient) -> Result<Value> {
    client
        .get(&app_endpoint(Some("health")))
        .await?
        .into_value("get app health")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eightkit_client::testing::{failure, ok, MockTransport};
    use eightkit_client::HttpMethod;
    use eightkit_core::{ClientConfig, Credentials, Error};
    use serde_json::json;
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("http://localhost:3000/", "key")),
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_info() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/apps/me", 200, ok(json!({"name": "billing"})));

        assert_eq!(info(&client(&mock)).await.unwrap(), json!({"name": "billing"}));
        assert_eq!(mock.requests()[0].url, "http://localhost:3000/api/v1/apps/me");
    }

    #[tokio::test]
    async fn test_health_rejected() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/apps/health", 200, failure("DEGRADED", "Database down"));

        let err = health(&client(&mock)).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
    }
}
