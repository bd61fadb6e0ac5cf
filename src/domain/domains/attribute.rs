//! Attribute definitions for custom aspects and links.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Type of a single custom attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AttributeDefinition {
    Boolean,
    /// ISO date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 date and time.
    DateTime,
    #[serde(rename_all = "camelCase")]
    Enum { allowed_values: Vec<String> },
    /// URI pointing to an external document.
    ExternalDocument,
    Integer,
    #[serde(rename_all = "camelCase")]
    List { item_definition: Box<AttributeDefinition> },
    Text,
}

impl AttributeDefinition {
    /// Validates a JSON value against this definition.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            AttributeDefinition::Boolean => {
                value.as_bool().map(|_| ()).ok_or_else(|| "must be a boolean".to_string())
            }
            AttributeDefinition::Date => {
                let s = value.as_str().ok_or_else(|| "must be a date string".to_string())?;
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|_| format!("'{}' is not a valid date (YYYY-MM-DD)", s))
            }
            AttributeDefinition::DateTime => {
                let s = value
                    .as_str()
                    .ok_or_else(|| "must be a date-time string".to_string())?;
                DateTime::parse_from_rfc3339(s)
                    .map(|_| ())
                    .map_err(|_| format!("'{}' is not a valid RFC 3339 date-time", s))
            }
            AttributeDefinition::Enum { allowed_values } => {
                let s = value.as_str().ok_or_else(|| "must be a string".to_string())?;
                if allowed_values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is not one of [{}]",
                        s,
                        allowed_values.join(", ")
                    ))
                }
            }
            AttributeDefinition::ExternalDocument => {
                let s = value.as_str().ok_or_else(|| "must be a URI string".to_string())?;
                if is_uri(s) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a valid URI", s))
                }
            }
            AttributeDefinition::Integer => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err("must be an integer".to_string())
                }
            }
            AttributeDefinition::List { item_definition } => {
                let items = value.as_array().ok_or_else(|| "must be a list".to_string())?;
                for (index, item) in items.iter().enumerate() {
                    item_definition
                        .validate(item)
                        .map_err(|reason| format!("item {}: {}", index, reason))?;
                }
                Ok(())
            }
            AttributeDefinition::Text => value
                .as_str()
                .map(|_| ())
                .ok_or_else(|| "must be a string".to_string()),
        }
    }

    /// JSON schema fragment for this attribute.
    pub fn to_json_schema(&self) -> Value {
        match self {
            AttributeDefinition::Boolean => json!({"type": "boolean"}),
            AttributeDefinition::Date => json!({"type": "string", "format": "date"}),
            AttributeDefinition::DateTime => json!({"type": "string", "format": "date-time"}),
            AttributeDefinition::Enum { allowed_values } => {
                json!({"type": "string", "enum": allowed_values})
            }
            AttributeDefinition::ExternalDocument => json!({"type": "string", "format": "uri"}),
            AttributeDefinition::Integer => json!({"type": "integer"}),
            AttributeDefinition::List { item_definition } => {
                json!({"type": "array", "items": item_definition.to_json_schema()})
            }
            AttributeDefinition::Text => json!({"type": "string"}),
        }
    }
}

/// `scheme:rest` with an RFC 3986 scheme.
pub(crate) fn is_uri(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && scheme.chars().next().map_or(false, |c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
