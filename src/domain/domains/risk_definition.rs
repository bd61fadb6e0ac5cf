//! Risk definitions: probability and impact scales plus the risk matrix.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ElementType, ErrorCode, TranslatedText};

use super::ElementTypeDefinition;

/// One step of a probability, impact, or implementation scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionLevel {
    pub ordinal_value: u32,
    #[serde(default, skip_serializing_if = "TranslatedText::is_empty")]
    pub name: TranslatedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskValue {
    pub ordinal_value: u32,
    pub symbolic_risk: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityDefinition {
    pub levels: Vec<DimensionLevel>,
}

/// Impact category (confidentiality, integrity, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    pub id: String,
    pub potential_impacts: Vec<DimensionLevel>,
    /// Rows are impacts, columns are probabilities. Absent for categories
    /// that only record impacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_matrix: Option<Vec<Vec<RiskValue>>>,
}

impl CategoryDefinition {
    pub fn supports_risk_values(&self) -> bool {
        self.value_matrix.is_some()
    }

    /// Looks up the risk for a probability and impact ordinal.
    pub fn risk_value(&self, probability: u32, impact: u32) -> Result<&RiskValue, DomainError> {
        let matrix = self.value_matrix.as_ref().ok_or_else(|| {
            DomainError::new(
                ErrorCode::Unprocessable,
                format!("Category {} does not support risk values.", self.id),
            )
        })?;
        let row = matrix.get(impact as usize).ok_or_else(|| {
            DomainError::new(
                ErrorCode::Unprocessable,
                format!("No risk value for category: {}", impact),
            )
        })?;
        row.get(probability as usize).ok_or_else(|| {
            DomainError::new(
                ErrorCode::Unprocessable,
                format!("No risk value for probability: {}", probability),
            )
        })
    }

    fn validate(
        &self,
        risk_values: &[RiskValue],
        probability: &ProbabilityDefinition,
    ) -> Result<(), DomainError> {
        let Some(matrix) = &self.value_matrix else {
            return Ok(());
        };
        let undefined: Vec<&RiskValue> = matrix
            .iter()
            .flatten()
            .filter(|rv| !risk_values.contains(rv))
            .collect();
        if !undefined.is_empty() {
            let names: Vec<&str> = undefined.iter().map(|rv| rv.symbolic_risk.as_str()).collect();
            return Err(invalid(format!(
                "Invalid risk values for category {}: {}",
                self.id,
                names.join(", ")
            )));
        }
        if matrix.len() != self.potential_impacts.len() {
            return Err(invalid(format!(
                "Value matrix for category {} does not conform to impacts.",
                self.id
            )));
        }
        if matrix.iter().any(|row| row.len() != probability.levels.len()) {
            return Err(invalid(format!(
                "Value matrix for category {} does not conform to probability.",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDefinition {
    pub id: String,
    #[serde(default)]
    pub probability: ProbabilityDefinition,
    #[serde(default)]
    pub implementation_state_definition: ProbabilityDefinition,
    pub categories: Vec<CategoryDefinition>,
    #[serde(default)]
    pub risk_values: Vec<RiskValue>,
    /// Link types along which impacts are inherited, per element type.
    #[serde(default)]
    pub impact_inheriting_links: BTreeMap<ElementType, Vec<String>>,
}

impl RiskDefinition {
    pub fn category(&self, id: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn risk_value_by_ordinal(&self, ordinal: u32) -> Option<&RiskValue> {
        self.risk_values.iter().find(|rv| rv.ordinal_value == ordinal)
    }

    /// Checks internal consistency and link references against `types`.
    pub fn validate(
        &self,
        types: &BTreeMap<ElementType, ElementTypeDefinition>,
    ) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        if !self.categories.iter().all(|c| seen.insert(c.id.as_str())) {
            return Err(invalid("Categories not unique."));
        }
        let mut seen = HashSet::new();
        if !self
            .risk_values
            .iter()
            .all(|rv| seen.insert(rv.symbolic_risk.as_str()))
        {
            return Err(invalid("SymbolicRisk not unique."));
        }
        for category in &self.categories {
            category.validate(&self.risk_values, &self.probability)?;
        }
        for (element_type, links) in &self.impact_inheriting_links {
            let definition = types.get(element_type);
            for link in links {
                if definition.and_then(|d| d.link(link)).is_none() {
                    return Err(invalid(format!(
                        "Link type '{}' does not exist for {}",
                        link,
                        element_type.plural_term()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Copy of this definition whose inheriting links all exist in `types`.
    ///
    /// Element types left without links are dropped.
    pub fn restricted_to_links(
        &self,
        types: &BTreeMap<ElementType, ElementTypeDefinition>,
    ) -> RiskDefinition {
        let mut copy = self.clone();
        copy.impact_inheriting_links = self
            .impact_inheriting_links
            .iter()
            .filter_map(|(element_type, links)| {
                let definition = types.get(element_type)?;
                let kept: Vec<String> = links
                    .iter()
                    .filter(|l| definition.link(l).is_some())
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| (*element_type, kept))
            })
            .collect();
        copy
    }
}

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::Unprocessable, message)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::domains::LinkDefinition;
    use proptest::prelude::*;

    fn types_with_link(element_type: ElementType, link: &str) -> BTreeMap<ElementType, ElementTypeDefinition> {
        let mut def = ElementTypeDefinition::default();
        def.links.insert(
            link.into(),
            LinkDefinition {
                target_type: ElementType::Asset,
                target_sub_type: None,
                attribute_definitions: Default::default(),
            },
        );
        BTreeMap::from([(element_type, def)])
    }

    #[test]
    fn risk_matrix_lookup() {
        let def = risk_definition();
        let category = def.category("C").unwrap();
        assert_eq!(category.risk_value(2, 1).unwrap().symbolic_risk, "high");
        assert_eq!(category.risk_value(0, 0).unwrap().symbolic_risk, "low");
        assert!(category.risk_value(3, 0).is_err());
        assert!(category.risk_value(0, 3).is_err());
    }

    #[test]
    fn valid_definition_passes() {
        assert!(risk_definition().validate(&BTreeMap::new()).is_ok());
    }

    #[test]
    fn undefined_matrix_value_is_rejected() {
        let mut def = risk_definition();
        def.categories[0].value_matrix.as_mut().unwrap()[0][0] = rv(7, "extreme");
        let err = def.validate(&BTreeMap::new()).unwrap_err();
        assert_eq!(err.message, "Invalid risk values for category C: extreme");
    }

    #[test]
    fn matrix_shape_must_match_scales() {
        let mut def = risk_definition();
        def.probability.levels.pop();
        let err = def.validate(&BTreeMap::new()).unwrap_err();
        assert!(err.message.contains("does not conform to probability"));
    }

    #[test]
    fn duplicate_categories_are_rejected() {
        let mut def = risk_definition();
        let copy = def.categories[0].clone();
        def.categories.push(copy);
        assert_eq!(def.validate(&BTreeMap::new()).unwrap_err().message, "Categories not unique.");
    }

    #[test]
    fn inheriting_links_must_exist() {
        let mut def = risk_definition();
        def.impact_inheriting_links
            .insert(ElementType::Process, vec!["process_dataType".into()]);
        let err = def.validate(&BTreeMap::new()).unwrap_err();
        assert_eq!(
            err.message,
            "Link type 'process_dataType' does not exist for processes"
        );
        assert!(def
            .validate(&types_with_link(ElementType::Process, "process_dataType"))
            .is_ok());
    }

    #[test]
    fn restricted_to_links_drops_unknown_links_and_empty_types() {
        let mut def = risk_definition();
        def.impact_inheriting_links.insert(
            ElementType::Process,
            vec!["process_dataType".into(), "process_gone".into()],
        );
        def.impact_inheriting_links
            .insert(ElementType::Asset, vec!["asset_gone".into()]);

        let restricted = def.restricted_to_links(&types_with_link(ElementType::Process, "process_dataType"));

        assert_eq!(
            restricted.impact_inheriting_links,
            BTreeMap::from([(ElementType::Process, vec!["process_dataType".to_string()])])
        );
    }

    proptest! {
        #[test]
        fn every_in_range_cell_resolves(p in 0u32..3, i in 0u32..3) {
            let def = risk_definition();
            let value = def.category("C").unwrap().risk_value(p, i).unwrap();
            prop_assert!(def.risk_value_by_ordinal(value.ordinal_value).is_some());
        }
    }
}
