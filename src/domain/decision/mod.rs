//! Decision module - rule-based yes/no classification of elements.
//!
//! A decision applies to one element type and sub type. Its rules are
//! ordered by priority; the first matching rule determines the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::condition::{Condition, EvaluationContext};
use crate::domain::domains::Domain;
use crate::domain::element::{Element, ElementResolver};
use crate::domain::foundation::{DomainError, ElementType, ErrorCode, TranslatedText};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Result if this rule is decisive. `None` means "undecided".
    #[serde(default)]
    pub output: Option<bool>,
    #[serde(default)]
    pub description: TranslatedText,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(output: Option<bool>, description: TranslatedText) -> Self {
        Self {
            output,
            description,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// True if all conditions match. A rule without conditions always matches.
    pub fn matches(&self, ctx: &EvaluationContext<'_>) -> bool {
        self.conditions.iter().all(|c| c.matches(ctx))
    }
}

/// Outcome of a decision for one element.
///
/// Rule references are indexes into the decision's rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decisive_rule: Option<usize>,
    #[serde(default)]
    pub matching_rules: Vec<usize>,
    #[serde(default)]
    pub agreeing_rules: Vec<usize>,
}

impl DecisionResult {
    /// Result when no rule matched.
    pub fn undecided(value: Option<bool>) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub name: TranslatedText,
    pub element_type: ElementType,
    pub element_sub_type: String,
    /// Ordered by priority, highest first.
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub default_result_value: Option<bool>,
}

impl Decision {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DecisionResult {
        let matching: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(ctx))
            .map(|(i, _)| i)
            .collect();
        let Some(&decisive) = matching.first() else {
            return DecisionResult::undecided(self.default_result_value);
        };
        let value = self.rules[decisive].output;
        let agreeing = matching
            .iter()
            .copied()
            .filter(|&i| self.rules[i].output == value)
            .collect();
        DecisionResult {
            value,
            decisive_rule: Some(decisive),
            matching_rules: matching,
            agreeing_rules: agreeing,
        }
    }

    pub fn is_applicable_to_element(&self, element: &Element, domain: &Domain) -> bool {
        self.element_type == element.element_type()
            && element.sub_type(&domain.id()) == Some(self.element_sub_type.as_str())
    }

    /// Checks sub type and rule conditions against `domain`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the sub type or anything a condition refers to is missing
    pub fn validate(&self, domain: &Domain) -> Result<(), DomainError> {
        let defined = domain
            .element_type_definition(self.element_type)
            .and_then(|d| d.sub_type(&self.element_sub_type))
            .is_some();
        if !defined {
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!(
                    "Sub type '{}' is not defined for {}",
                    self.element_sub_type,
                    self.element_type.plural_term()
                ),
            ));
        }
        self.rules
            .iter()
            .flat_map(|r| &r.conditions)
            .try_for_each(|c| c.input.validate(domain, Some(self.element_type)))
    }
}

/// Evaluates every decision of a domain that applies to an element.
pub struct Decider;

impl Decider {
    pub fn decide(
        element: &Element,
        domain: &Domain,
        resolver: &dyn ElementResolver,
    ) -> BTreeMap<String, DecisionResult> {
        let ctx = EvaluationContext::new(element, domain, resolver);
        domain
            .decisions()
            .iter()
            .filter(|(_, decision)| decision.is_applicable_to_element(element, domain))
            .map(|(key, decision)| (key.clone(), decision.evaluate(&ctx)))
            .collect()
    }
}
