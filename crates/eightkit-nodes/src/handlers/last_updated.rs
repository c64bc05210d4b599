//! Last-updated markers

use chrono::DateTime;
use serde_json::{json, Value};
use tracing::info;

use eightkit_client::ApiClient;
use eightkit_core::endpoint::last_updated_endpoint;
use eightkit_core::validation::validate_key;
use eightkit_core::{Error, Result};

/// Record a last-updated marker. Blank description or date are left out;
/// a date must be RFC 3339.
pub async fn create(
    client: &ApiClient,
    key: &str,
    description: Option<&str>,
    date: Option<&str>,
) -> Result<Value> {
    validate_key(key)?;

    let mut body = json!({ "key": key });
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        body["description"] = Value::from(description);
    }
    if let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) {
        DateTime::parse_from_rfc3339(date).map_err(|e| {
            Error::invalid_parameter("date", format!("'{}' is not an RFC 3339 date: {}", date, e))
        })?;
        body["date"] = Value::from(date);
    }

    let record = client
        .post(&last_updated_endpoint(None), body)
        .await?
        .into_value("create last updated")?;
    info!(key, "Last updated recorded");
    Ok(record)
}

pub async fn get(client: &ApiClient, key: &str) -> Result<Value> {
    validate_key(key)?;
    client
        .get(&last_updated_endpoint(Some(key)))
        .await?
        .into_value("get last updated")
}
