//! Pull JSON out of free-form model output.
//!
//! Models are told to answer with JSON only but routinely wrap it in prose,
//! markdown fences or tags. Each helper here handles one of those shapes.

use regex::Regex;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

static VALUE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[[\s\S]*\]|\{[\s\S]*\})").expect("valid value regex"));

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?|```$").expect("valid fence regex"));

static JSON_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<json>(.*?)</json>").expect("valid tag regex"));

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No JSON found in AI response")]
    NotFound,
    #[error("Malformed JSON in AI response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse `text` as JSON, falling back to the widest `{...}` span
pub fn json_object(text: &str) -> Result<Value, ExtractError> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let span = OBJECT_SPAN.find(text).ok_or(ExtractError::NotFound)?;
    Ok(serde_json::from_str(span.as_str())?)
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and a trailing ```` ``` ````
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text.trim(), "").trim().to_string()
}

/// Parse `text` as JSON, falling back to the first array or object span
pub fn json_value(text: &str) -> Result<Value, ExtractError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let span = VALUE_SPAN.find(text).ok_or(ExtractError::NotFound)?;
    Ok(serde_json::from_str(span.as_str())?)
}

/// Parse the first `<json>...</json>` block
pub fn tagged_json(text: &str) -> Result<Value, ExtractError> {
    let captures = JSON_TAG.captures(text).ok_or(ExtractError::NotFound)?;
    Ok(serde_json::from_str(&captures[1])?)
}

/// Read a 0-100 score from an integer, a float (rounded) or a numeric string
pub fn score_from_value(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some((number.round() as i64).clamp(0, 100))
}

/// Read a list of strings; a bare string becomes a one-element list and
/// non-string elements are kept as their JSON text
pub fn string_list_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Whether a value would count as present: not null, false, zero or empty
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// `deserialize_with` adapter for [`score_from_value`]
pub fn deserialize_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    score_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a score between 0 and 100, got {}", value)))
}

/// `deserialize_with` adapter for [`string_list_from_value`]
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    string_list_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a list of strings, got {}", value)))
}
