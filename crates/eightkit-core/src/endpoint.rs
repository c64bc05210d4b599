//! Endpoint paths of the 8kit REST API
//!
//! All functions return a path relative to the host URL, starting with
//! `/api/v1`. User-supplied segments are percent-encoded.

use crate::error::{Error, Result};
use crate::types::ResourceKind;

/// Version prefix shared by every endpoint
pub const API_PREFIX: &str = "/api/v1";

/// `/api/v1/{sets|lookups}`
pub fn collection_endpoint(kind: ResourceKind) -> String {
    format!("{}/{}", API_PREFIX, kind.collection())
}

/// `/api/v1/{sets|lookups}/{name}[/{subpath}]`
///
/// An empty `subpath` is treated like `None`.
pub fn resource_endpoint(kind: ResourceKind, name: &str, subpath: Option<&str>) -> Result<String> {
    if name.is_empty() {
        return Err(Error::validation(format!(
            "{} name is required to build endpoint",
            kind
        )));
    }

    let base = format!("{}/{}", collection_endpoint(kind), urlencoding::encode(name));
    Ok(match subpath.filter(|s| !s.is_empty()) {
        Some(sub) => format!("{}/{}", base, sub.trim_start_matches('/')),
        None => base,
    })
}

/// `/api/v1/{sets|lookups}/{name}/values/{value}`
pub fn value_endpoint(kind: ResourceKind, name: &str, value: &str) -> Result<String> {
    let values = resource_endpoint(kind, name, Some("values"))?;
    Ok(format!("{}/{}", values, urlencoding::encode(value)))
}

/// `/api/v1/locks[/{key}]`
pub fn lock_endpoint(key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{}/locks/{}", API_PREFIX, urlencoding::encode(key)),
        None => format!("{}/locks", API_PREFIX),
    }
}

/// `/api/v1/last-updated[/key/{key}]`
pub fn last_updated_endpoint(key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{}/last-updated/key/{}", API_PREFIX, urlencoding::encode(key)),
        None => format!("{}/last-updated", API_PREFIX),
    }
}

/// `/api/v1/apps[/{operation}]`
pub fn app_endpoint(operation: Option<&str>) -> String {
    match operation {
        Some(op) => format!("{}/apps/{}", API_PREFIX, op),
        None => format!("{}/apps", API_PREFIX),
    }
}

/// Append `?k=v&...` with encoded values; no-op for an empty list.
pub fn with_query<K, V>(path: &str, pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return path.to_string();
    }

    let query = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", path, query)
}
