//! Resource existence and auto-create

use serde_json::{json, Value};
use tracing::{debug, info};

use eightkit_core::endpoint::{collection_endpoint, resource_endpoint};
use eightkit_core::validation::validate_name;
use eightkit_core::{Error, ResourceKind, Result};

use crate::client::ApiClient;

/// Outcome of [`ApiClient::create_if_missing`]
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    /// The resource was already there
    Existing,
    /// The resource was created; carries the API record (`null` when the
    /// API answered without one)
    Created(Value),
}

impl Provisioned {
    pub fn was_created(&self) -> bool {
        matches!(self, Provisioned::Created(_))
    }
}

/// Description attached to resources created on demand
pub fn auto_create_description(kind: ResourceKind, name: &str) -> String {
    format!(
        "Auto-created {} for {} by 8kit node",
        kind.label().to_lowercase(),
        name
    )
}

impl ApiClient {
    /// Whether the set or lookup `name` exists.
    ///
    /// "Not found" (HTTP 404 or a `*_NOT_FOUND` code) maps to `false`;
    /// every other failure is returned.
    pub async fn exists(&self, kind: ResourceKind, name: &str) -> Result<bool> {
        let endpoint = resource_endpoint(kind, name, None)?;

        let action = format!("get {} info", kind.label().to_lowercase());
        let outcome = self
            .get(&endpoint)
            .await
            .and_then(|response| response.into_result(&action));

        match outcome {
            Ok(_) => {
                debug!(resource = %kind, name, "Resource exists");
                Ok(true)
            }
            Err(e) if e.is_not_found(kind) => {
                debug!(resource = %kind, name, "Resource does not exist");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a set or lookup; returns the API record, `null` when the
    /// response carried none.
    pub async fn create_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        description: Option<&str>,
    ) -> Result<Value> {
        validate_name(kind, name)?;

        let mut body = json!({ "name": name });
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            body["description"] = json!(description);
        }

        let action = format!("create {}", kind.label().to_lowercase());
        let record = self
            .post(&collection_endpoint(kind), body)
            .await?
            .into_value(&action)?;

        info!(resource = %kind, name, "Resource created");
        Ok(record)
    }

    /// Make sure `name` exists, creating it when `auto_create` is set.
    pub async fn create_if_missing(
        &self,
        kind: ResourceKind,
        name: &str,
        auto_create: bool,
    ) -> Result<Provisioned> {
        if self.exists(kind, name).await? {
            return Ok(Provisioned::Existing);
        }

        if !auto_create {
            return Err(Error::not_found(kind, name));
        }

        let description = auto_create_description(kind, name);
        let record = self.create_resource(kind, name, Some(&description)).await?;
        Ok(Provisioned::Created(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failure, ok, MockTransport};
    use crate::transport::HttpMethod;
    use eightkit_core::{ClientConfig, Credentials};
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("http://localhost:3000", "key")),
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_exists_is_stable() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/orders", 200, ok(json!({"name": "orders"})));

        let client = client(&mock);
        assert!(client.exists(ResourceKind::Set, "orders").await.unwrap());
        assert!(client.exists(ResourceKind::Set, "orders").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false_on_not_found() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/missing", 404, failure("SET_NOT_FOUND", "Set not found"));
        mock.reply(HttpMethod::Get, "/api/v1/lookups/gone", 200, failure("LOOKUP_NOT_FOUND", "Lookup not found"));

        let client = client(&mock);
        assert!(!client.exists(ResourceKind::Set, "missing").await.unwrap());
        assert!(!client.exists(ResourceKind::Lookup, "gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_propagates_other_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/orders", 403, failure("FORBIDDEN", "Invalid API key"));

        let err = client(&mock).exists(ResourceKind::Set, "orders").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_create_if_missing_without_auto_create() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/missing", 404, failure("SET_NOT_FOUND", "Set not found"));

        let err = client(&mock)
            .create_if_missing(ResourceKind::Set, "missing", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound { .. }));
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/sets"), 0);
    }

    #[tokio::test]
    async fn test_create_if_missing_creates_once() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/lookups/ids", 404, failure("LOOKUP_NOT_FOUND", "Lookup not found"));
        mock.reply(HttpMethod::Post, "/api/v1/lookups", 201, ok(json!({"id": "l1", "name": "ids"})));

        let provisioned = client(&mock)
            .create_if_missing(ResourceKind::Lookup, "ids", true)
            .await
            .unwrap();
        assert!(provisioned.was_created());

        let creates = mock.requests_to(HttpMethod::Post, "/api/v1/lookups");
        assert_eq!(creates.len(), 1);
        assert_eq!(
            creates[0].body,
            Some(json!({"name": "ids", "description": "Auto-created lookup for ids by 8kit node"}))
        );
    }

    #[tokio::test]
    async fn test_create_if_missing_noop_when_present() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/orders", 200, ok(json!({"name": "orders"})));

        let provisioned = client(&mock)
            .create_if_missing(ResourceKind::Set, "orders", true)
            .await
            .unwrap();
        assert_eq!(provisioned, Provisioned::Existing);
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/sets"), 0);
    }

    #[tokio::test]
    async fn test_create_without_data_succeeds() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, "/api/v1/sets", 200, json!({"success": true}));

        let record = client(&mock)
            .create_resource(ResourceKind::Set, "orders", None)
            .await
            .unwrap();
        assert_eq!(record, Value::Null);
    }

    #[tokio::test]
    async fn test_create_if_missing_accepts_empty_create_body() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/sets/orders", 404, failure("SET_NOT_FOUND", "Set not found"));
        mock.reply(HttpMethod::Post, "/api/v1/sets", 201, Value::Null);

        let provisioned = client(&mock)
            .create_if_missing(ResourceKind::Set, "orders", true)
            .await
            .unwrap();
        assert_eq!(provisioned, Provisioned::Created(Value::Null));
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/sets"), 1);
    }

    #[tokio::test]
    async fn test_create_rejected_payload() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Post, "/api/v1/sets", 200, failure("SET_EXISTS", "Set already exists"));

        let err = client(&mock)
            .create_resource(ResourceKind::Set, "orders", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to create set: Set already exists");
    }
}
