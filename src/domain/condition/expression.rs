//! Expressions that extract values from an element within a domain.
//!
//! Expressions are stored as JSON inside domain definitions (decision rules,
//! inspections) and tagged by `type`:
//!
//! ```json
//! {"type": "customAspectAttributeValue", "customAspect": "gdpr", "attribute": "legalBasis"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::domains::Domain;
use crate::domain::element::{Element, ElementResolver};
use crate::domain::foundation::{DomainError, ElementType, ErrorCode};

use super::ExpressionValue;

/// Everything an expression may look at.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub element: &'a Element,
    pub domain: &'a Domain,
    pub resolver: &'a dyn ElementResolver,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(element: &'a Element, domain: &'a Domain, resolver: &'a dyn ElementResolver) -> Self {
        Self {
            element,
            domain,
            resolver,
        }
    }

    /// Same context, focused on another element.
    fn with_element(&self, element: &'a Element) -> Self {
        Self { element, ..*self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VeoExpression {
    /// True if every operand is true.
    And { operands: Vec<VeoExpression> },
    CurrentElement,
    Constant { value: Value },
    /// True if `value` is an item of the list `values`.
    Contains {
        values: Box<VeoExpression>,
        value: Box<VeoExpression>,
    },
    /// Length of a list attribute.
    #[serde(rename_all = "camelCase")]
    CustomAspectAttributeSize {
        custom_aspect: String,
        attribute: String,
    },
    #[serde(rename_all = "camelCase")]
    CustomAspectAttributeValue {
        custom_aspect: String,
        attribute: String,
    },
    Equals {
        left: Box<VeoExpression>,
        right: Box<VeoExpression>,
    },
    /// Stored result value of another decision.
    DecisionResultValue { decision: String },
    /// Controls of all requirement implementations.
    ImplementedRequirements,
    #[serde(rename_all = "camelCase")]
    LinkTargets { link_type: String },
    /// Evaluates `transformation` for every element in `source`.
    Map {
        source: Box<VeoExpression>,
        transformation: Box<VeoExpression>,
    },
    MaxRisk,
    #[serde(rename_all = "camelCase")]
    PartCount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        part_sub_type: Option<String>,
    },
    /// `source` without every item equal to `value`.
    Remove {
        source: Box<VeoExpression>,
        value: Box<VeoExpression>,
    },
}

impl VeoExpression {
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> ExpressionValue {
        let domain_id = ctx.domain.id();
        match self {
            VeoExpression::And { operands } => operands
                .iter()
                .all(|op| op.evaluate(ctx).as_bool() == Some(true))
                .into(),
            VeoExpression::CurrentElement => ExpressionValue::Element(ctx.element.id()),
            VeoExpression::Constant { value } => ExpressionValue::from_json(value),
            VeoExpression::Contains { values, value } => {
                let needle = value.evaluate(ctx);
                values.evaluate(ctx).into_items().contains(&needle).into()
            }
            VeoExpression::CustomAspectAttributeSize {
                custom_aspect,
                attribute,
            } => match attribute_value(ctx, custom_aspect, attribute) {
                Some(Value::Array(items)) => ExpressionValue::Number(items.len() as f64),
                _ => ExpressionValue::Null,
            },
            VeoExpression::CustomAspectAttributeValue {
                custom_aspect,
                attribute,
            } => attribute_value(ctx, custom_aspect, attribute)
                .map_or(ExpressionValue::Null, ExpressionValue::from_json),
            VeoExpression::Equals { left, right } => {
                (left.evaluate(ctx) == right.evaluate(ctx)).into()
            }
            VeoExpression::DecisionResultValue { decision } => ctx
                .element
                .association(&domain_id)
                .and_then(|a| a.decision_results.get(decision))
                .and_then(|r| r.value)
                .map_or(ExpressionValue::Null, ExpressionValue::Bool),
            VeoExpression::ImplementedRequirements => ExpressionValue::List(
                ctx.element
                    .requirement_implementations()
                    .iter()
                    .map(|ri| ExpressionValue::Element(ri.control))
                    .collect(),
            ),
            VeoExpression::LinkTargets { link_type } => ExpressionValue::List(
                ctx.element
                    .association(&domain_id)
                    .and_then(|a| a.links.get(link_type))
                    .map(|links| {
                        links
                            .iter()
                            .map(|l| ExpressionValue::Element(l.target))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            VeoExpression::Map {
                source,
                transformation,
            } => ExpressionValue::List(
                source
                    .evaluate(ctx)
                    .into_items()
                    .into_iter()
                    .map(|item| match item {
                        ExpressionValue::Element(id) => match ctx.resolver.resolve(&id) {
                            Some(target) => transformation.evaluate(&ctx.with_element(target)),
                            None => ExpressionValue::Null,
                        },
                        _ => ExpressionValue::Null,
                    })
                    .collect(),
            ),
            VeoExpression::MaxRisk => {
                if ctx.element.element_type().is_risk_affected() {
                    ctx.element.max_risk(ctx.domain).into()
                } else {
                    ExpressionValue::Null
                }
            }
            VeoExpression::PartCount { part_sub_type } => {
                let count = ctx
                    .element
                    .parts()
                    .iter()
                    .filter(|id| match part_sub_type {
                        None => true,
                        Some(wanted) => ctx
                            .resolver
                            .resolve(id)
                            .and_then(|part| part.sub_type(&domain_id))
                            == Some(wanted.as_str()),
                    })
                    .count();
                ExpressionValue::Number(count as f64)
            }
            VeoExpression::Remove { source, value } => {
                let unwanted = value.evaluate(ctx);
                ExpressionValue::List(
                    source
                        .evaluate(ctx)
                        .into_items()
                        .into_iter()
                        .filter(|item| item != &unwanted)
                        .collect(),
                )
            }
        }
    }

    /// Checks that everything this expression references exists in `domain`
    /// for elements of `element_type`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for unknown custom aspects, attributes, or link types
    pub fn validate(&self, domain: &Domain, element_type: Option<ElementType>) -> Result<(), DomainError> {
        match self {
            VeoExpression::And { operands } => operands
                .iter()
                .try_for_each(|op| op.validate(domain, element_type)),
            VeoExpression::Contains { values, value } => {
                values.validate(domain, element_type)?;
                value.validate(domain, element_type)
            }
            VeoExpression::Equals { left, right } => {
                left.validate(domain, element_type)?;
                right.validate(domain, element_type)
            }
            VeoExpression::Remove { source, value } => {
                source.validate(domain, element_type)?;
                value.validate(domain, element_type)
            }
            VeoExpression::Map {
                source,
                transformation,
            } => {
                source.validate(domain, element_type)?;
                // Targets of the source may have any type.
                transformation.validate(domain, None)
            }
            VeoExpression::CustomAspectAttributeSize {
                custom_aspect,
                attribute,
            }
            | VeoExpression::CustomAspectAttributeValue {
                custom_aspect,
                attribute,
            } => {
                let Some(element_type) = element_type else {
                    return Ok(());
                };
                let defined = domain
                    .element_type_definition(element_type)
                    .and_then(|d| d.custom_aspect(custom_aspect))
                    .map_or(false, |a| a.attribute_definitions.contains_key(attribute));
                if defined {
                    Ok(())
                } else {
                    Err(DomainError::new(
                        ErrorCode::NotFound,
                        format!(
                            "Attribute '{}' of custom aspect '{}' is not defined for {}",
                            attribute,
                            custom_aspect,
                            element_type.plural_term()
                        ),
                    ))
                }
            }
            VeoExpression::LinkTargets { link_type } => {
                let Some(element_type) = element_type else {
                    return Ok(());
                };
                if domain
                    .element_type_definition(element_type)
                    .and_then(|d| d.link(link_type))
                    .is_some()
                {
                    Ok(())
                } else {
                    Err(DomainError::new(
                        ErrorCode::NotFound,
                        format!(
                            "Link type '{}' does not exist for {}",
                            link_type,
                            element_type.plural_term()
                        ),
                    ))
                }
            }
            VeoExpression::DecisionResultValue { decision } => {
                if domain.decision(decision).is_some() {
                    Ok(())
                } else {
                    Err(DomainError::new(
                        ErrorCode::NotFound,
                        format!("Decision '{}' does not exist", decision),
                    ))
                }
            }
            VeoExpression::CurrentElement
            | VeoExpression::Constant { .. }
            | VeoExpression::ImplementedRequirements
            | VeoExpression::MaxRisk
            | VeoExpression::PartCount { .. } => Ok(()),
        }
    }
}

fn attribute_value<'a>(
    ctx: &EvaluationContext<'a>,
    custom_aspect: &str,
    attribute: &str,
) -> Option<&'a Value> {
    ctx.element
        .association(&ctx.domain.id())?
        .custom_aspects
        .get(custom_aspect)?
        .get(attribute)
}
