//! Workflow node abstraction
//!
//! A node receives a batch of items from the host, runs one operation per
//! item and produces JSON items on one or more named outputs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use eightkit_core::Result;

use crate::context::NodeContext;
use crate::params::Parameters;

/// One item of the host batch with its resolved parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    pub json: Value,
    #[serde(default)]
    pub parameters: Parameters,
}

impl InputItem {
    pub fn new(json: Value, parameters: Parameters) -> Self {
        Self { json, parameters }
    }

    /// Field of the item's JSON, `None` for absent or `null`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.json.get(name).filter(|v| !v.is_null())
    }

    /// Copy of the item's JSON object (empty for non-object items)
    pub fn json_object(&self) -> Map<String, Value> {
        match &self.json {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }

    /// `{...item, ...fields}`
    pub fn merged(&self, fields: Map<String, Value>) -> Value {
        let mut json = self.json_object();
        json.extend(fields);
        Value::Object(json)
    }
}

/// What a node produced for one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// One item on output `output`
    Emit { output: usize, json: Value },
    /// Several items, possibly on different outputs
    Routed(Vec<(usize, Value)>),
    /// Nothing for this item
    Skip,
}

impl ItemOutcome {
    /// One item on the first output
    pub fn main(json: Value) -> Self {
        ItemOutcome::Emit { output: 0, json }
    }
}

/// What happens when an item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the run and surface the error
    #[default]
    Abort,
    /// Emit `{...item, error, success: false}` on the first output and go on
    ContinueWithErrorItem,
}

/// Trait for workflow nodes
#[async_trait]
pub trait Node: Send + Sync {
    /// Node type name
    fn name(&self) -> &str;

    /// Output names; the first item's parameters decide
    fn output_names(&self, parameters: &Parameters) -> Vec<String>;

    /// Error policy for an item
    fn error_policy(&self, _parameters: &Parameters) -> Result<ErrorPolicy> {
        Ok(ErrorPolicy::Abort)
    }

    /// Run the selected operation for one item
    async fn execute_item(
        &self,
        ctx: &NodeContext,
        index: usize,
        item: &InputItem,
    ) -> Result<ItemOutcome>;
}

/// Items collected on one named output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputChannel {
    pub name: String,
    pub items: Vec<Value>,
}

/// All outputs of one node run, in output order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    pub channels: Vec<OutputChannel>,
}

impl NodeOutput {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            channels: names
                .into_iter()
                .map(|name| OutputChannel {
                    name,
                    items: Vec::new(),
                })
                .collect(),
        }
    }

    /// Items of output `index` (empty when there is no such output)
    pub fn channel(&self, index: usize) -> &[Value] {
        self.channels
            .get(index)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn main(&self) -> &[Value] {
        self.channel(0)
    }

    /// `[[items of output 0], [items of output 1], ...]`
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.channels
                .iter()
                .map(|c| Value::Array(c.items.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merged_overrides_item_fields() {
        let item = InputItem::new(json!({"id": 1, "exists": "old"}), Parameters::new());
        let mut fields = Map::new();
        fields.insert("exists".to_string(), json!(true));
        assert_eq!(item.merged(fields), json!({"id": 1, "exists": true}));
    }

    #[test]
    fn test_field_skips_null() {
        let item = InputItem::new(json!({"a": null, "b": "x"}), Parameters::new());
        assert!(item.field("a").is_none());
        assert_eq!(item.field("b"), Some(&json!("x")));
    }

    #[test]
    fn test_output_json_shape() {
        let mut output = NodeOutput::new(vec!["Existing Values".into(), "Non-Existing Values".into()]);
        output.channels[1].items.push(json!({"v": 1}));
        assert_eq!(output.to_json(), json!([[], [{"v": 1}]]));
        assert!(output.channel(5).is_empty());
    }
}
