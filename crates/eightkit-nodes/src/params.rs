//! Node parameters
//!
//! The host resolves every declared parameter per item and hands them over
//! as a JSON object. `null` is treated like an absent parameter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use eightkit_core::{json_type_name, Error, Result};

/// Resolved parameters of one item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object; `null` gives empty parameters.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::invalid_parameter(
                "parameters",
                format!("must be an object, got {}", json_type_name(&other)),
            )),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Required string parameter. May be empty; callers validate content.
    pub fn string(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("must be a string, got {}", json_type_name(other)),
            )),
            None => Err(Error::invalid_parameter(name, "is required")),
        }
    }

    pub fn string_or(&self, name: &str, default: &str) -> Result<String> {
        if self.contains(name) {
            self.string(name)
        } else {
            Ok(default.to_string())
        }
    }

    /// Trimmed string, `None` when absent or blank.
    pub fn optional_string(&self, name: &str) -> Result<Option<String>> {
        if !self.contains(name) {
            return Ok(None);
        }
        let value = self.string(name)?;
        let trimmed = value.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::invalid_parameter(name, format!("must be a boolean, got '{}'", s))),
            },
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("must be a boolean, got {}", json_type_name(other)),
            )),
        }
    }

    /// Non-negative integer; numeric strings are accepted.
    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>> {
        let invalid = || Error::invalid_parameter(name, "must be a non-negative integer");
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .map(Some)
                .ok_or_else(invalid),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    pub fn u64_or(&self, name: &str, default: u64) -> Result<u64> {
        Ok(self.optional_u64(name)?.unwrap_or(default))
    }

    /// Nested parameter group; absent groups are empty.
    pub fn collection(&self, name: &str) -> Result<Parameters> {
        match self.get(name) {
            None => Ok(Parameters::default()),
            Some(Value::Object(map)) => Ok(Parameters(map.clone())),
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("must be an object, got {}", json_type_name(other)),
            )),
        }
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
