//! Field selection for value metadata

use serde_json::{Map, Value};

/// Ordered set of input field names copied into value metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    fields: Vec<String>,
}

impl FieldSelector {
    /// Parse a comma-separated list. Names are trimmed; blanks and
    /// repeats are dropped, first occurrence wins.
    pub fn parse(list: &str) -> Self {
        let mut fields: Vec<String> = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy the selected fields present in `item`.
    ///
    /// With `include_timestamp` a `timestamp` entry (RFC 3339, UTC) is added
    /// first. Returns `None` when nothing was collected.
    pub fn build_metadata(&self, item: &Value, include_timestamp: bool) -> Option<Map<String, Value>> {
        let mut metadata = Map::new();

        if include_timestamp {
            metadata.insert(
                "timestamp".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }

        for field in &self.fields {
            if let Some(value) = item.get(field) {
                metadata.insert(field.clone(), value.clone());
            }
        }

        if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        }
    }
}
