//! Risks of risk-affected elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::domains::RiskDefinition;
use crate::domain::foundation::{DomainError, DomainId, ElementId, ErrorCode};

/// Risk an element runs through a scenario, evaluated with one risk definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRisk {
    pub scenario: ElementId,
    pub domain: DomainId,
    pub risk_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<u32>,
    /// Impact ordinal per category id.
    #[serde(default)]
    pub impacts: BTreeMap<String, u32>,
    /// Residual risk ordinal per category id, set after treatment.
    #[serde(default)]
    pub residual_risks: BTreeMap<String, u32>,
}

/// Inherent and residual risk of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterminedRisk {
    pub category: String,
    pub inherent_risk: Option<u32>,
    pub residual_risk: Option<u32>,
}

impl ElementRisk {
    pub fn new(scenario: ElementId, domain: DomainId, risk_definition: impl Into<String>) -> Self {
        Self {
            scenario,
            domain,
            risk_definition: risk_definition.into(),
            probability: None,
            impacts: BTreeMap::new(),
            residual_risks: BTreeMap::new(),
        }
    }

    /// Computes per-category risks from the definition's value matrix.
    ///
    /// Residual risk falls back to the inherent risk when not set.
    pub fn determine(&self, definition: &RiskDefinition) -> Vec<DeterminedRisk> {
        definition
            .categories
            .iter()
            .filter(|c| c.supports_risk_values())
            .map(|category| {
                let inherent = match (self.probability, self.impacts.get(&category.id)) {
                    (Some(p), Some(i)) => category.risk_value(p, *i).ok().map(|rv| rv.ordinal_value),
                    _ => None,
                };
                let residual = self.residual_risks.get(&category.id).copied().or(inherent);
                DeterminedRisk {
                    category: category.id.clone(),
                    inherent_risk: inherent,
                    residual_risk: residual,
                }
            })
            .collect()
    }

    /// Checks ordinals against the definition's scales.
    pub fn validate(&self, definition: &RiskDefinition) -> Result<(), DomainError> {
        if let Some(p) = self.probability {
            if !definition.probability.levels.iter().any(|l| l.ordinal_value == p) {
                return Err(unprocessable(format!("Invalid probability {}", p)));
            }
        }
        for (category_id, impact) in &self.impacts {
            let category = definition
                .category(category_id)
                .ok_or_else(|| unprocessable(format!("Unknown risk category '{}'", category_id)))?;
            if !category.potential_impacts.iter().any(|l| l.ordinal_value == *impact) {
                return Err(unprocessable(format!(
                    "Invalid impact {} for category '{}'",
                    impact, category_id
                )));
            }
        }
        for (category_id, residual) in &self.residual_risks {
            if definition.category(category_id).is_none() {
                return Err(unprocessable(format!("Unknown risk category '{}'", category_id)));
            }
            if definition.risk_value_by_ordinal(*residual).is_none() {
                return Err(unprocessable(format!("Invalid risk value {}", residual)));
            }
        }
        Ok(())
    }
}

fn unprocessable(message: String) -> DomainError {
    DomainError::new(ErrorCode::Unprocessable, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domains::risk_definition::fixtures::risk_definition;

    fn risk() -> ElementRisk {
        ElementRisk::new(ElementId::new(), DomainId::new(), "DSRA")
    }

    #[test]
    fn determine_uses_matrix_for_inherent_risk() {
        let mut r = risk();
        r.probability = Some(2);
        r.impacts.insert("C".into(), 1);

        let determined = r.determine(&risk_definition());

        assert_eq!(
            determined,
            vec![DeterminedRisk {
                category: "C".into(),
                inherent_risk: Some(2),
                residual_risk: Some(2),
            }]
        );
    }

    #[test]
    fn residual_risk_overrides_inherent() {
        let mut r = risk();
        r.probability = Some(2);
        r.impacts.insert("C".into(), 2);
        r.residual_risks.insert("C".into(), 0);

        let determined = r.determine(&risk_definition());

        assert_eq!(determined[0].inherent_risk, Some(2));
        assert_eq!(determined[0].residual_risk, Some(0));
    }

    #[test]
    fn missing_probability_leaves_risk_undetermined() {
        let mut r = risk();
        r.impacts.insert("C".into(), 2);
        assert_eq!(r.determine(&risk_definition())[0].inherent_risk, None);
    }

    #[test]
    fn validate_rejects_out_of_scale_values() {
        let def = risk_definition();
        let mut r = risk();
        r.probability = Some(9);
        assert!(r.validate(&def).is_err());

        let mut r = risk();
        r.impacts.insert("X".into(), 0);
        assert_eq!(r.validate(&def).unwrap_err().message, "Unknown risk category 'X'");

        let mut r = risk();
        r.probability = Some(1);
        r.impacts.insert("C".into(), 1);
        r.residual_risks.insert("C".into(), 1);
        assert!(r.validate(&def).is_ok());
    }
}
