//! Set and lookup management: create, list, info, values

use serde_json::Value;

use eightkit_client::ApiClient;
use eightkit_core::endpoint::{collection_endpoint, resource_endpoint, with_query};
use eightkit_core::validation::validate_name;
use eightkit_core::{Error, Pagination, ResourceKind, Result};

pub async fn create(
    client: &ApiClient,
    kind: ResourceKind,
    name: &str,
    description: Option<&str>,
) -> Result<Value> {
    client.create_resource(kind, name, description).await
}

pub async fn list(client: &ApiClient, kind: ResourceKind, page: Pagination) -> Result<Value> {
    let path = with_query(&collection_endpoint(kind), &page.query_pairs());
    let action = format!("list {}", kind.collection());
    client.get(&path).await?.into_value(&action)
}

/// Details of one set or lookup; a missing one is [`Error::ResourceNotFound`].
pub async fn info(client: &ApiClient, kind: ResourceKind, name: &str) -> Result<Value> {
    validate_name(kind, name)?;

    let action = format!("get {} info", kind.label().to_lowercase());
    client
        .get(&resource_endpoint(kind, name, None)?)
        .await
        .and_then(|response| response.into_value(&action))
        .map_err(|e| {
            if e.is_not_found(kind) {
                Error::not_found(kind, name)
            } else {
                e
            }
        })
}

pub async fn values(client: &ApiClient, kind: ResourceKind, name: &str, page: Pagination) -> Result<Value> {
    validate_name(kind, name)?;

    let path = with_query(&resource_endpoint(kind, name, Some("values"))?, &page.query_pairs());
    let action = format!("get {} values", kind.label().to_lowercase());
    client.get(&path).await?.into_value(&action)
}
