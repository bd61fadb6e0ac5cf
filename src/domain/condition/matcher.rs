//! Conditions: an input expression plus a matcher on its value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EvaluationContext, ExpressionValue, VeoExpression};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Matcher {
    IsNull,
    IsNotNull,
    Equals { value: Value },
    /// Numeric comparison; non-numbers never match.
    GreaterThan { value: f64 },
    IsTrue,
    IsFalse,
}

impl Matcher {
    pub fn matches(&self, value: &ExpressionValue) -> bool {
        match self {
            Matcher::IsNull => value.is_null(),
            Matcher::IsNotNull => !value.is_null(),
            Matcher::Equals { value: expected } => &ExpressionValue::from_json(expected) == value,
            Matcher::GreaterThan { value: threshold } => {
                value.as_number().map_or(false, |n| n > *threshold)
            }
            Matcher::IsTrue => value.as_bool() == Some(true),
            Matcher::IsFalse => value.as_bool() == Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub input: VeoExpression,
    pub matcher: Matcher,
}

impl Condition {
    pub fn new(input: VeoExpression, matcher: Matcher) -> Self {
        Self { input, matcher }
    }

    pub fn matches(&self, ctx: &EvaluationContext<'_>) -> bool {
        self.matcher.matches(&self.input.evaluate(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn greater_than_ignores_non_numbers() {
        let m = Matcher::GreaterThan { value: 1.0 };
        assert!(m.matches(&ExpressionValue::Number(2.0)));
        assert!(!m.matches(&ExpressionValue::Number(1.0)));
        assert!(!m.matches(&ExpressionValue::Null));
        assert!(!m.matches(&ExpressionValue::Text("5".into())));
    }

    #[test]
    fn equals_compares_json_constants() {
        let m = Matcher::Equals { value: json!("yes") };
        assert!(m.matches(&ExpressionValue::Text("yes".into())));
        assert!(!m.matches(&ExpressionValue::Text("no".into())));
    }

    #[test]
    fn bool_matchers_reject_null() {
        assert!(!Matcher::IsTrue.matches(&ExpressionValue::Null));
        assert!(!Matcher::IsFalse.matches(&ExpressionValue::Null));
        assert!(Matcher::IsFalse.matches(&ExpressionValue::Bool(false)));
    }

    #[test]
    fn matcher_deserializes_by_type_tag() {
        let m: Matcher = serde_json::from_value(json!({"type": "greaterThan", "value": 2})).unwrap();
        assert_eq!(m, Matcher::GreaterThan { value: 2.0 });
        let m: Matcher = serde_json::from_value(json!({"type": "isNull"})).unwrap();
        assert_eq!(m, Matcher::IsNull);
    }
}
