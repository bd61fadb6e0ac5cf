//! Values produced by evaluating expressions.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::ElementId;

/// Result of evaluating a `VeoExpression`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpressionValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ExpressionValue>),
    /// Reference to an element, resolved lazily.
    Element(ElementId),
}

impl ExpressionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ExpressionValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExpressionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExpressionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Items of a list; any other value yields nothing.
    pub fn into_items(self) -> Vec<ExpressionValue> {
        match self {
            ExpressionValue::List(items) => items,
            _ => Vec::new(),
        }
    }

    /// Converts stored JSON (attribute values, constants) into a value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ExpressionValue::Null,
            Value::Bool(b) => ExpressionValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(ExpressionValue::Null, ExpressionValue::Number),
            Value::String(s) => ExpressionValue::Text(s.clone()),
            Value::Array(items) => ExpressionValue::List(items.iter().map(Self::from_json).collect()),
            Value::Object(_) => ExpressionValue::Text(value.to_string()),
        }
    }
}

impl From<bool> for ExpressionValue {
    fn from(b: bool) -> Self {
        ExpressionValue::Bool(b)
    }
}

impl From<Option<u32>> for ExpressionValue {
    fn from(n: Option<u32>) -> Self {
        n.map_or(ExpressionValue::Null, |n| ExpressionValue::Number(f64::from(n)))
    }
}
