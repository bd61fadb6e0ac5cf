//! Per-domain shape of each element type.
//!
//! A domain defines, for every element type, which sub types exist (and
//! their statuses), which custom aspects may be attached, and which link
//! types may point to other elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{ElementType, TranslatedText};

use super::AttributeDefinition;

/// Named set of attribute definitions.
pub type AttributeDefinitions = BTreeMap<String, AttributeDefinition>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTypeDefinition {
    /// Allowed statuses, in workflow order.
    pub statuses: Vec<String>,
    #[serde(default, skip_serializing_if = "TranslatedText::is_empty")]
    pub name: TranslatedText,
}

impl SubTypeDefinition {
    pub fn new(statuses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            statuses: statuses.into_iter().map(Into::into).collect(),
            name: TranslatedText::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAspectDefinition {
    pub attribute_definitions: AttributeDefinitions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDefinition {
    pub target_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sub_type: Option<String>,
    #[serde(default)]
    pub attribute_definitions: AttributeDefinitions,
}

/// Shape of one element type within a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTypeDefinition {
    #[serde(default)]
    pub sub_types: BTreeMap<String, SubTypeDefinition>,
    #[serde(default)]
    pub custom_aspects: BTreeMap<String, CustomAspectDefinition>,
    #[serde(default)]
    pub links: BTreeMap<String, LinkDefinition>,
}

impl ElementTypeDefinition {
    pub fn sub_type(&self, sub_type: &str) -> Option<&SubTypeDefinition> {
        self.sub_types.get(sub_type)
    }

    pub fn has_status(&self, sub_type: &str, status: &str) -> bool {
        self.sub_type(sub_type)
            .map_or(false, |def| def.statuses.iter().any(|s| s == status))
    }

    pub fn custom_aspect(&self, aspect_type: &str) -> Option<&CustomAspectDefinition> {
        self.custom_aspects.get(aspect_type)
    }

    pub fn link(&self, link_type: &str) -> Option<&LinkDefinition> {
        self.links.get(link_type)
    }
}

/// Validates a set of attribute values against their definitions.
///
/// Unknown attributes and invalid values produce one message each.
pub fn validate_attributes(
    definitions: &AttributeDefinitions,
    attributes: &Map<String, Value>,
) -> Vec<String> {
    let mut errors = Vec::new();
    for (key, value) in attributes {
        match definitions.get(key) {
            None => errors.push(format!("Attribute '{}' is not defined", key)),
            Some(def) => {
                if let Err(reason) = def.validate(value) {
                    errors.push(format!("Invalid value for attribute '{}': {}", key, reason));
                }
            }
        }
    }
    errors
}

/// Removes attributes that are undefined or hold invalid values. Returns
/// the removed keys.
pub fn prune_attributes(
    definitions: &AttributeDefinitions,
    attributes: &mut Map<String, Value>,
) -> Vec<String> {
    let invalid: Vec<String> = attributes
        .iter()
        .filter(|(key, value)| definitions.get(*key).map_or(true, |def| def.validate(value).is_err()))
        .map(|(key, _)| key.clone())
        .collect();
    for key in &invalid {
        attributes.remove(key);
    }
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset_definition() -> ElementTypeDefinition {
        serde_json::from_value(json!({
            "subTypes": {
                "AST_IT": {"statuses": ["NEW", "IN_PROGRESS", "RELEASED"]}
            },
            "customAspects": {
                "asset_details": {
                    "attributeDefinitions": {
                        "asset_details_operatingStage": {"type": "enum", "allowedValues": ["planning", "operation"]},
                        "asset_details_number": {"type": "integer"}
                    }
                }
            },
            "links": {
                "asset_owner": {"targetType": "person", "targetSubType": "PER_Employee", "attributeDefinitions": {}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn status_lookup_by_sub_type() {
        let def = asset_definition();
        assert!(def.has_status("AST_IT", "NEW"));
        assert!(!def.has_status("AST_IT", "ARCHIVED"));
        assert!(!def.has_status("AST_Other", "NEW"));
    }

    #[test]
    fn link_definition_carries_target() {
        let def = asset_definition();
        let link = def.link("asset_owner").unwrap();
        assert_eq!(link.target_type, ElementType::Person);
        assert_eq!(link.target_sub_type.as_deref(), Some("PER_Employee"));
    }

    #[test]
    fn attribute_validation_reports_each_problem() {
        let def = asset_definition();
        let aspect = def.custom_aspect("asset_details").unwrap();
        let attrs = json!({
            "asset_details_operatingStage": "demolition",
            "asset_details_number": 4,
            "asset_details_color": "red"
        });
        let errors = validate_attributes(
            &aspect.attribute_definitions,
            attrs.as_object().unwrap(),
        );
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("asset_details_color")));
        assert!(errors.iter().any(|e| e.contains("demolition")));
    }
}
