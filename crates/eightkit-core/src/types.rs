//! Common types shared by the client and the nodes

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Kind of named, app-scoped resource on the 8kit API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Set,
    Lookup,
}

impl ResourceKind {
    /// Path segment of the collection (`sets` / `lookups`)
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Set => "sets",
            ResourceKind::Lookup => "lookups",
        }
    }

    /// Display label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Set => "Set",
            ResourceKind::Lookup => "Lookup",
        }
    }

    /// Error code the API uses when the resource does not exist
    pub fn not_found_code(&self) -> &'static str {
        match self {
            ResourceKind::Set => "SET_NOT_FOUND",
            ResourceKind::Lookup => "LOOKUP_NOT_FOUND",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Envelope every 8kit endpoint answers with.
///
/// The client hands this back as-is for 2xx responses; a `success: false`
/// body is not an error at that layer, callers decide what it means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T> ApiResponse<T> {
    /// Turn a `success: false` payload into [`Error::Rejected`].
    pub fn into_result(self, action: &str) -> Result<Option<T>> {
        if !self.success {
            return Err(Error::rejected(action, self.code, self.error));
        }
        Ok(self.data)
    }

    /// Like [`into_result`](Self::into_result) but also requires `data`.
    pub fn require_data(self, action: &str) -> Result<T> {
        self.into_result(action)?
            .ok_or_else(|| Error::MissingData(action.to_string()))
    }
}

impl ApiResponse<Value> {
    /// Re-read the untyped payload as `T`.
    pub fn parse<T: DeserializeOwned>(self) -> Result<ApiResponse<T>> {
        let data = match self.data {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        Ok(ApiResponse {
            success: self.success,
            data,
            error: self.error,
            code: self.code,
            details: self.details,
        })
    }

    /// Payload of a successful call, `null` when the API sent none.
    pub fn into_value(self, action: &str) -> Result<Value> {
        Ok(self.into_result(action)?.unwrap_or(Value::Null))
    }
}

/// Answer of `POST /sets/{name}/contains`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsResult {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One entry of a bulk membership check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCheck {
    pub value: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_value: Option<Value>,
}

/// Answer of `POST /sets/{name}/contains/bulk`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkContainsResult {
    #[serde(default)]
    pub found: Option<u64>,
    #[serde(default)]
    pub not_found: Option<u64>,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default, alias = "results")]
    pub checks: Vec<ValueCheck>,
}

/// Page selection for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Render as query pairs; `offset` is only sent when non-zero
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        pairs
    }
}

/// Name of the JSON type of a value, for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
