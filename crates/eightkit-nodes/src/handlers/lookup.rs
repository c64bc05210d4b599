//! Composite lookup operations: full lookup and search

use serde_json::{Map, Value};
use tracing::{debug, info};

use eightkit_client::ApiClient;
use eightkit_core::endpoint::{resource_endpoint, with_query};
use eightkit_core::validation::{validate_labeled_value, validate_name, validate_value};
use eightkit_core::{Error, ResourceKind, Result};

use super::values::{post_lookup_pair, post_set_value};

/// Which value of a mapping is tracked in the set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedValue {
    Left,
    Right,
    /// Input field with this name
    Custom(String),
}

impl TrackedValue {
    pub fn parse(kind: &str, custom_field: &str) -> Result<Self> {
        match kind {
            "left" => Ok(TrackedValue::Left),
            "right" => Ok(TrackedValue::Right),
            "custom" if custom_field.trim().is_empty() => Err(Error::invalid_parameter(
                "customSetValueField",
                "is required when setValueField is 'custom'",
            )),
            "custom" => Ok(TrackedValue::Custom(custom_field.trim().to_string())),
            other => Err(Error::invalid_parameter(
                "setValueField",
                format!("must be 'left', 'right' or 'custom', got '{}'", other),
            )),
        }
    }
}

/// Inputs of a full lookup
#[derive(Debug, Clone)]
pub struct FullLookupRequest<'a> {
    pub lookup_name: &'a str,
    pub set_name: &'a str,
    pub left: &'a str,
    pub right: &'a str,
    /// Value added to the set (already resolved from [`TrackedValue`])
    pub tracked_value: &'a str,
    pub metadata: Option<Map<String, Value>>,
    pub create_lookup_if_missing: bool,
    pub create_set_if_missing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullLookupOutcome {
    pub mapping: Value,
    pub set_value: Value,
    pub lookup_created: bool,
    pub set_created: bool,
}

/// Ensure lookup, ensure set, add the mapping, then track the value.
///
/// Steps are not rolled back: a failure leaves earlier side effects in
/// place.
pub async fn full_lookup(client: &ApiClient, request: FullLookupRequest<'_>) -> Result<FullLookupOutcome> {
    validate_name(ResourceKind::Lookup, request.lookup_name)?;
    validate_name(ResourceKind::Set, request.set_name)?;
    validate_labeled_value("Left value", request.left)?;
    validate_labeled_value("Right value", request.right)?;
    validate_value(request.tracked_value)?;

    let lookup = client
        .create_if_missing(ResourceKind::Lookup, request.lookup_name, request.create_lookup_if_missing)
        .await?;
    let set = client
        .create_if_missing(ResourceKind::Set, request.set_name, request.create_set_if_missing)
        .await?;

    let mapping = post_lookup_pair(
        client,
        request.lookup_name,
        request.left,
        request.right,
        request.metadata.clone(),
    )
    .await?;
    let set_value = post_set_value(client, request.set_name, request.tracked_value, request.metadata).await?;

    info!(
        lookup = request.lookup_name,
        set = request.set_name,
        tracked = request.tracked_value,
        "Full lookup recorded"
    );
    Ok(FullLookupOutcome {
        mapping,
        set_value,
        lookup_created: lookup.was_created(),
        set_created: set.was_created(),
    })
}

/// Side of a mapping searched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Left,
    Right,
    Both,
}

impl SearchType {
    pub fn parse(kind: &str) -> Result<Self> {
        match kind {
            "left" => Ok(SearchType::Left),
            "right" => Ok(SearchType::Right),
            "both" => Ok(SearchType::Both),
            other => Err(Error::invalid_parameter(
                "searchType",
                format!("must be 'left', 'right' or 'both', got '{}'", other),
            )),
        }
    }

    fn query_key(&self) -> &'static str {
        match self {
            SearchType::Left => "left",
            SearchType::Right => "right",
            SearchType::Both => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<Value>,
    pub total_found: u64,
    pub lookup_created: bool,
}

/// Search a lookup by left value, right value, or both.
pub async fn search_lookup(
    client: &ApiClient,
    lookup_name: &str,
    search_type: SearchType,
    term: &str,
    limit: u64,
    auto_create: bool,
) -> Result<SearchOutcome> {
    validate_name(ResourceKind::Lookup, lookup_name)?;
    validate_labeled_value("Search value", term)?;

    let provisioned = client
        .create_if_missing(ResourceKind::Lookup, lookup_name, auto_create)
        .await?;
    if provisioned.was_created() {
        // Fresh lookup, nothing to find.
        return Ok(SearchOutcome {
            results: Vec::new(),
            total_found: 0,
            lookup_created: true,
        });
    }

    let path = with_query(
        &resource_endpoint(ResourceKind::Lookup, lookup_name, Some("search"))?,
        &[(search_type.query_key(), term.to_string()), ("limit", limit.to_string())],
    );
    let data = client.get(&path).await?.into_value("search lookup")?;

    let (results, reported) = match data {
        Value::Array(results) => (results, None),
        Value::Object(mut map) => {
            let results = match map.remove("results") {
                Some(Value::Array(results)) => results,
                _ => Vec::new(),
            };
            (results, map.get("totalFound").and_then(Value::as_u64))
        }
        _ => (Vec::new(), None),
    };
    let total_found = reported.unwrap_or(results.len() as u64);

    debug!(lookup = lookup_name, total_found, "Lookup searched");
    Ok(SearchOutcome {
        results,
        total_found,
        lookup_created: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eightkit_client::testing::{failure, ok, MockTransport};
    use eightkit_client::HttpMethod;
    use eightkit_core::{ClientConfig, Credentials};
    use serde_json::json;
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("http://localhost:3000", "key")),
            ClientConfig::default(),
        )
    }

    fn request<'a>() -> FullLookupRequest<'a> {
        FullLookupRequest {
            lookup_name: "crm-ids",
            set_name: "synced",
            left: "L-1",
            right: "R-1",
            tracked_value: "L-1",
            metadata: None,
            create_lookup_if_missing: true,
            create_set_if_missing: false,
        }
    }

    #[test]
    fn test_tracked_value_parse() {
        assert_eq!(TrackedValue::parse("left", "").unwrap(), TrackedValue::Left);
        assert_eq!(
            TrackedValue::parse("custom", " id ").unwrap(),
            TrackedValue::Custom("id".to_string())
        );
        assert!(TrackedValue::parse("custom", "").is_err());
        assert!(TrackedValue::parse("middle", "").is_err());
    }

    #[tokio::test]
    async fn test_full_lookup_runs_steps_in_order() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/lookups/crm-ids", 404, failure("LOOKUP_NOT_FOUND", "missing"));
        mock.reply(HttpMethod::Post, "/api/v1/lookups", 201, ok(json!({"name": "crm-ids"})));
        mock.reply(HttpMethod::Get, "/api/v1/sets/synced", 200, ok(json!({"name": "synced"})));
        mock.reply(HttpMethod::Post, "/api/v1/lookups/crm-ids/values", 201, ok(json!({"id": "m1"})));
        mock.reply(HttpMethod::Post, "/api/v1/sets/synced/values", 201, ok(json!({"id": "s1"})));

        let outcome = full_lookup(&client(&mock), request()).await.unwrap();
        assert!(outcome.lookup_created);
        assert!(!outcome.set_created);
        assert_eq!(outcome.mapping, json!({"id": "m1"}));

        let order: Vec<String> = mock
            .requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect();
        assert_eq!(
            order,
            vec![
                "GET /api/v1/lookups/crm-ids",
                "POST /api/v1/lookups",
                "GET /api/v1/sets/synced",
                "POST /api/v1/lookups/crm-ids/values",
                "POST /api/v1/sets/synced/values",
            ]
        );
    }

    #[tokio::test]
    async fn test_full_lookup_keeps_earlier_side_effects() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/lookups/crm-ids", 404, failure("LOOKUP_NOT_FOUND", "missing"));
        mock.reply(HttpMethod::Post, "/api/v1/lookups", 201, ok(json!({"name": "crm-ids"})));
        mock.reply(HttpMethod::Get, "/api/v1/sets/synced", 404, failure("SET_NOT_FOUND", "missing"));

        let err = full_lookup(&client(&mock), request()).await.unwrap_err();
        assert!(err.to_string().contains("Set \"synced\" not found"));
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/lookups"), 1);
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/lookups/crm-ids/values"), 0);
    }

    #[tokio::test]
    async fn test_search_lookup_query() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/lookups/crm-ids", 200, ok(json!({})));
        mock.reply(
            HttpMethod::Get,
            "/api/v1/lookups/crm-ids/search",
            200,
            ok(json!({"results": [{"left": "L-1", "right": "R-1"}], "totalFound": 4})),
        );

        let outcome = search_lookup(&client(&mock), "crm-ids", SearchType::Both, "L 1", 50, false)
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.total_found, 4);

        let search = mock.requests_to(HttpMethod::Get, "/api/v1/lookups/crm-ids/search");
        assert_eq!(search[0].path(), "/api/v1/lookups/crm-ids/search?search=L%201&limit=50");
    }

    #[tokio::test]
    async fn test_search_fresh_lookup_skips_query() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(HttpMethod::Get, "/api/v1/lookups/new", 404, failure("LOOKUP_NOT_FOUND", "missing"));
        mock.reply(HttpMethod::Post, "/api/v1/lookups", 201, ok(json!({"name": "new"})));

        let outcome = search_lookup(&client(&mock), "new", SearchType::Left, "x", 10, true)
            .await
            .unwrap();
        assert!(outcome.lookup_created);
        assert_eq!(outcome.total_found, 0);
        assert_eq!(mock.count(HttpMethod::Get, "/api/v1/lookups/new/search"), 0);
    }
}
