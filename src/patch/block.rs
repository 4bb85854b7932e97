//! Conversion between external structured data and configuration blocks
//!
//! A configuration block is the key/value parameter set attached to a
//! dependency reference (a step's `with:` mapping). Internally it is an
//! insertion-ordered map of dynamically typed values; every conversion to or
//! from other representations happens here.

use indexmap::IndexMap;
use serde_json::{Map, Value};

pub type ConfigBlock = IndexMap<String, Value>;

/// Convert a JSON value into a block. `null` is an empty block; anything
/// other than an object is rejected.
pub fn from_json(value: &Value) -> Option<ConfigBlock> {
    match value {
        Value::Null => Some(ConfigBlock::new()),
        Value::Object(map) => Some(
            map.iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        _ => None,
    }
}

pub fn to_json(block: &ConfigBlock) -> Value {
    Value::Object(
        block
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Map<String, Value>>(),
    )
}

/// Type a YAML scalar.
///
/// Quoted scalars are always strings. Plain `true`/`false` become booleans and
/// plain integers become numbers; everything else, floats included, stays a
/// string so values like `3.10` survive a round trip.
pub fn scalar_to_value(raw: &str, quoted: bool) -> Value {
    if quoted {
        return Value::String(raw.to_string());
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

/// Render a value the way it would appear as a YAML scalar
pub fn value_to_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Error type for building a block from command-line assignments
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum BlockError {
    #[error("Expected key=value, got {0:?}")]
    MissingSeparator(String),
}

/// Parse `key=value` pairs (as given on a command line) into a block
pub fn from_assignments<'a, I>(assignments: I) -> Result<ConfigBlock, BlockError>
where
    I: IntoIterator<Item = &'a str>,
{
    assignments
        .into_iter()
        .map(|assignment| -> Result<(String, Value), BlockError> {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| BlockError::MissingSeparator(assignment.to_string()))?;
            Ok((key.trim().to_string(), scalar_to_value(value.trim(), false)))
        })
        .collect()
}
