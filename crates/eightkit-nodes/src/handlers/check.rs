//! Set membership checks
//!
//! A check against a set that does not exist is either fatal or, with
//! auto-create, answered as "not a member" after creating the set.

use serde_json::{json, Value};
use tracing::{debug, info};

use eightkit_client::existence::auto_create_description;
use eightkit_client::ApiClient;
use eightkit_core::endpoint::resource_endpoint;
use eightkit_core::validation::{validate_name, validate_value};
use eightkit_core::{json_type_name, BulkContainsResult, ContainsResult, Error, ResourceKind, Result, ValueCheck};

/// Result of a single-value check
#[derive(Debug, Clone, PartialEq)]
pub struct SingleCheck {
    pub value: String,
    pub exists: bool,
    /// Stored record of the value, when the API returned one
    pub set_value: Option<Value>,
    /// The set was missing and has just been created
    pub set_created: bool,
}

/// Result of a bulk check, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BulkCheck {
    pub checks: Vec<ValueCheck>,
    pub found: u64,
    pub not_found: u64,
    pub errors: Vec<Value>,
    pub set_created: bool,
}

impl BulkCheck {
    pub fn values(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.value.as_str()).collect()
    }
}

/// Single value from a parameter or input field
pub fn single_value(raw: &Value) -> Result<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        other => Err(Error::validation(format!(
            "Value must be a string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Values for a bulk check: an array or a comma-separated string.
///
/// Entries are trimmed and empty ones dropped; numbers and booleans are
/// taken in their JSON spelling.
pub fn bulk_values(raw: &Value) -> Result<Vec<String>> {
    let values: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        other => {
            return Err(Error::validation(format!(
                "For bulk mode, value must be an array or comma-separated string, got {}",
                json_type_name(other)
            )))
        }
    };

    if values.is_empty() {
        return Err(Error::validation("No valid values provided for bulk check"));
    }
    Ok(values)
}

/// Check one value against `set_name`.
pub async fn check_value(
    client: &ApiClient,
    set_name: &str,
    value: &str,
    auto_create: bool,
) -> Result<SingleCheck> {
    validate_name(ResourceKind::Set, set_name)?;
    validate_value(value)?;

    let endpoint = resource_endpoint(ResourceKind::Set, set_name, Some("contains"))?;
    let outcome = client
        .post(&endpoint, json!({ "value": value }))
        .await
        .and_then(|response| response.require_data("check set value"));

    match outcome {
        Ok(data) => {
            let result: ContainsResult = serde_json::from_value(data)?;
            debug!(set = set_name, value, exists = result.exists, "Value checked");
            Ok(SingleCheck {
                value: value.to_string(),
                exists: result.exists,
                set_value: result.value.filter(|v| !v.is_null()),
                set_created: false,
            })
        }
        Err(e) if e.is_not_found(ResourceKind::Set) => {
            create_missing_set(client, set_name, auto_create).await?;
            Ok(SingleCheck {
                value: value.to_string(),
                exists: false,
                set_value: None,
                set_created: true,
            })
        }
        Err(e) => Err(e),
    }
}

/// Check several values against `set_name` in one call.
pub async fn check_values(
    client: &ApiClient,
    set_name: &str,
    values: &[String],
    auto_create: bool,
) -> Result<BulkCheck> {
    validate_name(ResourceKind::Set, set_name)?;
    if values.is_empty() {
        return Err(Error::validation("No valid values provided for bulk check"));
    }
    for value in values {
        validate_value(value)?;
    }

    let endpoint = resource_endpoint(ResourceKind::Set, set_name, Some("contains/bulk"))?;
    let outcome = client
        .post(&endpoint, json!({ "values": values }))
        .await
        .and_then(|response| response.require_data("check set values"));

    match outcome {
        Ok(data) => {
            let result: BulkContainsResult = serde_json::from_value(data)?;
            let checks = align_checks(values, result.checks);
            let found = checks.iter().filter(|c| c.exists).count() as u64;

            debug!(set = set_name, total = checks.len(), found, "Values checked");
            Ok(BulkCheck {
                found: result.found.unwrap_or(found),
                not_found: result.not_found.unwrap_or(checks.len() as u64 - found),
                errors: result.errors,
                checks,
                set_created: false,
            })
        }
        Err(e) if e.is_not_found(ResourceKind::Set) => {
            create_missing_set(client, set_name, auto_create).await?;
            let checks: Vec<ValueCheck> = values
                .iter()
                .map(|value| ValueCheck {
                    value: value.clone(),
                    exists: false,
                    set_value: None,
                })
                .collect();
            Ok(BulkCheck {
                found: 0,
                not_found: checks.len() as u64,
                errors: Vec::new(),
                checks,
                set_created: true,
            })
        }
        Err(e) => Err(e),
    }
}

async fn create_missing_set(client: &ApiClient, set_name: &str, auto_create: bool) -> Result<()> {
    if !auto_create {
        return Err(Error::not_found(ResourceKind::Set, set_name));
    }

    let description = auto_create_description(ResourceKind::Set, set_name);
    client
        .create_resource(ResourceKind::Set, set_name, Some(&description))
        .await?;
    info!(set = set_name, "Set created automatically");
    Ok(())
}

/// Put remote checks in input order. Every value is matched by name
/// first; values left over take the unclaimed entry at their position.
/// Values the API did not report count as absent.
fn align_checks(values: &[String], remote: Vec<ValueCheck>) -> Vec<ValueCheck> {
    let mut slots: Vec<Option<ValueCheck>> = remote.into_iter().map(Some).collect();

    let by_value: Vec<Option<ValueCheck>> = values
        .iter()
        .map(|value| {
            slots
                .iter()
                .position(|slot| slot.as_ref().map_or(false, |c| &c.value == value))
                .and_then(|pos| slots[pos].take())
        })
        .collect();

    values
        .iter()
        .zip(by_value)
        .enumerate()
        .map(|(index, (value, matched))| {
            let matched = matched.or_else(|| slots.get_mut(index).and_then(Option::take));
            match matched {
                Some(check) => ValueCheck {
                    value: value.clone(),
                    ..check
                },
                None => ValueCheck {
                    value: value.clone(),
                    exists: false,
                    set_value: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eightkit_client::testing::{failure, ok, MockTransport};
    use eightkit_client::HttpMethod;
    use eightkit_core::{ClientConfig, Credentials};
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(
            mock.clone(),
            Arc::new(Credentials::new("http://localhost:3000", "key")),
            ClientConfig::default(),
        )
    }

    fn check(value: &str, exists: bool) -> ValueCheck {
        ValueCheck {
            value: value.to_string(),
            exists,
            set_value: None,
        }
    }

    #[test]
    fn test_bulk_values_sources() {
        assert_eq!(
            bulk_values(&json!(["a", " b ", "", 7])).unwrap(),
            vec!["a", "b", "7"]
        );
        assert_eq!(bulk_values(&json!("a, b,,c")).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            bulk_values(&json!(42)).unwrap_err().to_string(),
            "For bulk mode, value must be an array or comma-separated string, got number"
        );
        assert_eq!(
            bulk_values(&json!(" , ")).unwrap_err().to_string(),
            "No valid values provided for bulk check"
        );
    }

    #[test]
    fn test_single_value_requires_string() {
        assert_eq!(single_value(&json!("x")).unwrap(), "x");
        assert_eq!(
            single_value(&json!(12)).unwrap_err().to_string(),
            "Value must be a string, got number"
        );
    }

    #[test]
    fn test_align_checks_matches_by_value_then_position() {
        let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let remote = vec![check("c", true), check("a", false)];
        let aligned = align_checks(&values, remote);
        assert_eq!(aligned, vec![check("a", false), check("b", false), check("c", true)]);

        let renamed = align_checks(&values[..2], vec![check("a", true), check("B", true)]);
        assert_eq!(renamed, vec![check("a", true), check("b", true)]);
    }

    #[test]
    fn test_align_checks_positional_fill_skips_claimed_entries() {
        let values = vec!["x".to_string(), "b".to_string()];
        let aligned = align_checks(&values, vec![check("b", true), check("X", false)]);
        assert_eq!(aligned, vec![check("x", false), check("b", true)]);
    }

    #[tokio::test]
    async fn test_check_value_exists() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            HttpMethod::Post,
            "/api/v1/sets/orders/contains",
            200,
            ok(json!({"exists": true, "value": {"id": "v1"}})),
        );

        let result = check_value(&client(&mock), "orders", "ORD-1", false).await.unwrap();
        assert!(result.exists);
        assert_eq!(result.set_value, Some(json!({"id": "v1"})));
        assert_eq!(
            mock.requests()[0].body,
            Some(json!({"value": "ORD-1"}))
        );
    }

    #[tokio::test]
    async fn test_check_value_missing_set_with_auto_create() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            HttpMethod::Post,
            "/api/v1/sets/new-set/contains",
            404,
            failure("SET_NOT_FOUND", "Set not found"),
        );
        mock.reply(HttpMethod::Post, "/api/v1/sets", 201, ok(json!({"name": "new-set"})));

        let result = check_value(&client(&mock), "new-set", "v", true).await.unwrap();
        assert!(!result.exists);
        assert!(result.set_created);
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/sets"), 1);
    }

    #[tokio::test]
    async fn test_check_value_missing_set_without_auto_create() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            HttpMethod::Post,
            "/api/v1/sets/missing/contains",
            404,
            failure("SET_NOT_FOUND", "Set not found"),
        );

        let err = check_value(&client(&mock), "missing", "v", false).await.unwrap_err();
        assert!(err.to_string().contains("Set \"missing\" not found"));
        assert_eq!(mock.count(HttpMethod::Post, "/api/v1/sets"), 0);
    }

    #[tokio::test]
    async fn test_check_values_uses_bulk_endpoint() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            HttpMethod::Post,
            "/api/v1/sets/orders/contains/bulk",
            200,
            ok(json!({
                "found": 1,
                "notFound": 1,
                "errors": [],
                "results": [
                    {"value": "b", "exists": false},
                    {"value": "a", "exists": true, "setValue": {"id": 1}}
                ]
            })),
        );

        let values = vec!["a".to_string(), "b".to_string()];
        let result = check_values(&client(&mock), "orders", &values, false).await.unwrap();
        assert_eq!(result.values(), vec!["a", "b"]);
        assert!(result.checks[0].exists);
        assert_eq!(result.checks[0].set_value, Some(json!({"id": 1})));
        assert_eq!((result.found, result.not_found), (1, 1));
        assert_eq!(mock.requests()[0].body, Some(json!({"values": ["a", "b"]})));
    }

    #[tokio::test]
    async fn test_check_values_validates_every_value() {
        let mock = Arc::new(MockTransport::new());
        let values = vec!["ok".to_string(), "x".repeat(256)];
        let err = check_values(&client(&mock), "orders", &values, false).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(mock.requests().is_empty());
    }
}
