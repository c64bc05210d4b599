//! Adding and removing set values and lookup mappings

use serde_json::{json, Map, Value};
use tracing::info;

use eightkit_client::{ApiClient, Provisioned};
use eightkit_core::endpoint::{resource_endpoint, value_endpoint};
use eightkit_core::validation::{validate_labeled_value, validate_name, validate_value};
use eightkit_core::{ResourceKind, Result};

/// A created value record
#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    pub record: Value,
    /// The set/lookup did not exist and was created first
    pub created: bool,
}

/// Add `value` to the set `set_name`.
pub async fn add_to_set(
    client: &ApiClient,
    set_name: &str,
    value: &str,
    metadata: Option<Map<String, Value>>,
    auto_create: bool,
) -> Result<Added> {
    validate_name(ResourceKind::Set, set_name)?;
    validate_value(value)?;

    let provisioned = client
        .create_if_missing(ResourceKind::Set, set_name, auto_create)
        .await?;
    let record = post_set_value(client, set_name, value, metadata).await?;

    Ok(Added {
        record,
        created: provisioned.was_created(),
    })
}

/// Created records of a multi-value add, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct AddedAll {
    pub records: Vec<Value>,
    pub created: bool,
}

/// Add several values to one set. Existence is resolved once; values are
/// posted one by one and the first failure stops the rest.
pub async fn add_all_to_set(
    client: &ApiClient,
    set_name: &str,
    values: &[String],
    metadata: Option<Map<String, Value>>,
    auto_create: bool,
) -> Result<AddedAll> {
    validate_name(ResourceKind::Set, set_name)?;
    for value in values {
        validate_value(value)?;
    }

    let provisioned = client
        .create_if_missing(ResourceKind::Set, set_name, auto_create)
        .await?;

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        records.push(post_set_value(client, set_name, value, metadata.clone()).await?);
    }

    Ok(AddedAll {
        records,
        created: provisioned.was_created(),
    })
}

/// Add the mapping `left -> right` to the lookup `lookup_name`.
pub async fn add_to_lookup(
    client: &ApiClient,
    lookup_name: &str,
    left: &str,
    right: &str,
    left_metadata: Option<Map<String, Value>>,
    auto_create: bool,
) -> Result<Added> {
    validate_name(ResourceKind::Lookup, lookup_name)?;
    validate_labeled_value("Left value", left)?;
    validate_labeled_value("Right value", right)?;

    let provisioned = client
        .create_if_missing(ResourceKind::Lookup, lookup_name, auto_create)
        .await?;
    let record = post_lookup_pair(client, lookup_name, left, right, left_metadata).await?;

    Ok(Added {
        record,
        created: matches!(provisioned, Provisioned::Created(_)),
    })
}

/// Remove `value` from the set `set_name`; returns the API confirmation.
pub async fn remove_from_set(client: &ApiClient, set_name: &str, value: &str) -> Result<Value> {
    remove_value(client, ResourceKind::Set, set_name, value).await
}

/// Remove the mapping identified by `value` from `lookup_name`.
pub async fn remove_from_lookup(client: &ApiClient, lookup_name: &str, value: &str) -> Result<Value> {
    remove_value(client, ResourceKind::Lookup, lookup_name, value).await
}

async fn remove_value(client: &ApiClient, kind: ResourceKind, name: &str, value: &str) -> Result<Value> {
    validate_name(kind, name)?;
    validate_value(value)?;

    let action = format!("remove value from {}", kind.label().to_lowercase());
    let confirmation = client
        .delete(&value_endpoint(kind, name, value)?)
        .await?
        .into_value(&action)?;

    info!(resource = %kind, name, value, "Value removed");
    Ok(confirmation)
}

pub(crate) async fn post_set_value(
    client: &ApiClient,
    set_name: &str,
    value: &str,
    metadata: Option<Map<String, Value>>,
) -> Result<Value> {
    let mut body = json!({ "value": value });
    if let Some(metadata) = metadata {
        body["metadata"] = Value::Object(metadata);
    }

    let endpoint = resource_endpoint(ResourceKind::Set, set_name, Some("values"))?;
    let record = client
        .post(&endpoint, body)
        .await?
        .require_data("add value to set")?;

    info!(set = set_name, value, "Value added to set");
    Ok(record)
}

pub(crate) async fn post_lookup_pair(
    client: &ApiClient,
    lookup_name: &str,
    left: &str,
    right: &str,
    left_metadata: Option<Map<String, Value>>,
) -> Result<Value> {
    let mut body = json!({ "left": left, "right": right });
    if let Some(metadata) = left_metadata {
        body["leftMetadata"] = Value::Object(metadata);
    }

    let endpoint = resource_endpoint(ResourceKind::Lookup, lookup_name, Some("values"))?;
    let record = client
        .post(&endpoint, body)
        .await?
        .require_data("add value pair to lookup")?;

    info!(lookup = lookup_name, left, right, "Mapping added to lookup");
    Ok(record)
}
