//! The two workflow nodes
//!
//! [`EightKitNode`] exposes every API operation and splits membership
//! checks over two outputs. [`StratagemsNode`] offers the higher-level
//! tool operations on a single, filtered output.

pub mod eightkit;
pub mod stratagems;

pub use eightkit::{EightKitNode, EightKitOperation};
pub use stratagems::{StratagemsNode, StratagemsOperation};

use serde_json::{json, Map, Value};

/// Output items must be objects; anything else is wrapped as `{data}`.
pub(crate) fn as_object(data: Value) -> Value {
    match data {
        Value::Object(_) | Value::Null => data,
        other => json!({ "data": other }),
    }
}

/// `Map` from `(key, value)` pairs
pub(crate) fn fields<I>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_object_wraps_scalars() {
        assert_eq!(as_object(json!([1, 2])), json!({"data": [1, 2]}));
        assert_eq!(as_object(json!({"a": 1})), json!({"a": 1}));
        assert_eq!(as_object(Value::Null), Value::Null);
    }
}
