//! Inspection module - dynamic checks that point out problems with elements.
//!
//! An inspection holds a condition and suggestions. When the condition
//! evaluates to `true` for an element, a `Finding` is produced.

use serde::{Deserialize, Serialize};

use crate::domain::condition::{EvaluationContext, ExpressionValue, VeoExpression};
use crate::domain::domains::Domain;
use crate::domain::element::{Element, ElementResolver};
use crate::domain::foundation::{DomainError, ElementType, ErrorCode, TranslatedText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Suggestion {
    /// Add a part with the given sub type.
    #[serde(rename_all = "camelCase")]
    AddPart { part_sub_type: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub severity: Severity,
    #[serde(default)]
    pub description: TranslatedText,
    /// Applies to all element types when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<ElementType>,
    /// Applies to all sub types when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_sub_type: Option<String>,
    pub condition: VeoExpression,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub description: TranslatedText,
    pub suggestions: Vec<Suggestion>,
}

impl Inspection {
    pub fn new(severity: Severity, description: TranslatedText, condition: VeoExpression) -> Self {
        Self {
            severity,
            description,
            element_type: None,
            element_sub_type: None,
            condition,
            suggestions: Vec::new(),
        }
    }

    pub fn for_element(mut self, element_type: ElementType, sub_type: Option<String>) -> Self {
        self.element_type = Some(element_type);
        self.element_sub_type = sub_type;
        self
    }

    pub fn suggest_adding_part(mut self, part_sub_type: impl Into<String>) -> Self {
        self.suggestions.push(Suggestion::AddPart {
            part_sub_type: part_sub_type.into(),
        });
        self
    }

    pub fn run(&self, ctx: &EvaluationContext<'_>) -> Option<Finding> {
        if self.element_type.map_or(false, |t| t != ctx.element.element_type()) {
            return None;
        }
        if let Some(sub_type) = &self.element_sub_type {
            if ctx.element.sub_type(&ctx.domain.id()) != Some(sub_type.as_str()) {
                return None;
            }
        }
        (self.condition.evaluate(ctx) == ExpressionValue::Bool(true)).then(|| Finding {
            severity: self.severity,
            description: self.description.clone(),
            suggestions: self.suggestions.clone(),
        })
    }

    /// # Errors
    ///
    /// - `NotFound` if the sub type or anything the condition refers to is missing
    pub fn validate(&self, domain: &Domain) -> Result<(), DomainError> {
        if let (Some(element_type), Some(sub_type)) = (self.element_type, &self.element_sub_type) {
            if domain
                .element_type_definition(element_type)
                .and_then(|d| d.sub_type(sub_type))
                .is_none()
            {
                return Err(DomainError::new(
                    ErrorCode::NotFound,
                    format!(
                        "Sub type '{}' is not defined for {}",
                        sub_type,
                        element_type.plural_term()
                    ),
                ));
            }
        }
        self.condition.validate(domain, self.element_type)
    }
}

/// Runs all inspections of a domain on an element.
pub struct Inspector;

impl Inspector {
    pub fn inspect(
        element: &Element,
        domain: &Domain,
        resolver: &dyn ElementResolver,
    ) -> Vec<Finding> {
        let ctx = EvaluationContext::new(element, domain, resolver);
        domain
            .inspections()
            .values()
            .filter_map(|inspection| inspection.run(&ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domains::fixtures::test_domain;
    use crate::domain::element::aggregate::fixtures::element;
    use crate::domain::element::{DomainAssociation, NoElements};
    use crate::domain::foundation::{ClientId, UnitId};
    use serde_json::json;

    fn no_parts() -> VeoExpression {
        VeoExpression::Equals {
            left: Box::new(VeoExpression::PartCount { part_sub_type: None }),
            right: Box::new(VeoExpression::Constant { value: json!(0) }),
        }
    }

    #[test]
    fn finding_when_condition_is_true() {
        let domain = test_domain(ClientId::new());
        let mut asset = element(ElementType::Asset, domain.client_id(), UnitId::new());
        asset.associate_with_domain(domain.id(), DomainAssociation::new("AST_IT", "NEW"));
        let ctx = EvaluationContext::new(&asset, &domain, &NoElements);
        let inspection = Inspection::new(Severity::Warning, TranslatedText::of("en", "No parts"), no_parts())
            .for_element(ElementType::Asset, Some("AST_IT".into()))
            .suggest_adding_part("AST_IT");

        let finding = inspection.run(&ctx).unwrap();

        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(
            finding.suggestions,
            vec![Suggestion::AddPart {
                part_sub_type: "AST_IT".into()
            }]
        );
    }

    #[test]
    fn skips_other_types_and_sub_types() {
        let domain = test_domain(ClientId::new());
        let person = element(ElementType::Person, domain.client_id(), UnitId::new());
        let ctx = EvaluationContext::new(&person, &domain, &NoElements);
        let inspection = Inspection::new(Severity::Hint, TranslatedText::new(), no_parts())
            .for_element(ElementType::Asset, None);
        assert!(inspection.run(&ctx).is_none());

        let any_type = Inspection::new(Severity::Hint, TranslatedText::new(), no_parts())
            .for_element(ElementType::Person, Some("PER_Employee".into()));
        assert!(any_type.run(&ctx).is_none());
    }

    #[test]
    fn null_condition_is_not_a_finding() {
        let domain = test_domain(ClientId::new());
        let asset = element(ElementType::Asset, domain.client_id(), UnitId::new());
        let ctx = EvaluationContext::new(&asset, &domain, &NoElements);
        let inspection = Inspection::new(Severity::Info, TranslatedText::new(), VeoExpression::MaxRisk);
        assert!(inspection.run(&ctx).is_none());
    }

    #[test]
    fn inspector_runs_domain_inspections() {
        let domain = test_domain(ClientId::new());
        let mut asset = element(ElementType::Asset, domain.client_id(), UnitId::new());
        asset.associate_with_domain(domain.id(), DomainAssociation::new("AST_IT", "NEW"));

        let findings = Inspector::inspect(&asset, &domain, &NoElements);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Hint).unwrap(), "\"HINT\"");
    }
}
