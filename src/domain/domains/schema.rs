//! JSON schema of element payloads, derived from a client's domains.
//!
//! The schema fixes the payload structure (base properties, references,
//! risks) and narrows the per-domain parts to what the domains define:
//! sub types, statuses per sub type, custom aspects, and links.

use serde_json::{json, Map, Value};

use crate::domain::element::MAX_NAME_LENGTH;
use crate::domain::foundation::ElementType;

use super::{AttributeDefinitions, Domain, ElementTypeDefinition, LinkDefinition};

pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Properties the server fills in. Clients may echo them back on update.
const READ_ONLY_PROPERTIES: [&str; 9] = [
    "id",
    "type",
    "designator",
    "createdAt",
    "createdBy",
    "updatedAt",
    "updatedBy",
    "version",
    "requirementImplementations",
];

/// Builds element schemas for one element type.
pub struct ElementSchemaGenerator;

impl ElementSchemaGenerator {
    /// Schema for `element_type` payloads restricted to `domains`.
    ///
    /// Inactive domains are left out, so payloads referring to them fail
    /// validation.
    pub fn generate(element_type: ElementType, domains: &[Domain]) -> Value {
        let mut properties = Map::new();
        properties.insert(
            "name".into(),
            json!({"type": "string", "minLength": 1, "maxLength": MAX_NAME_LENGTH}),
        );
        properties.insert("abbreviation".into(), json!({"type": "string"}));
        properties.insert("description".into(), json!({"type": "string"}));
        properties.insert("owner".into(), json!({"type": "string", "minLength": 1}));

        let children = if element_type.is_composite() {
            "parts"
        } else {
            "members"
        };
        properties.insert(
            children.into(),
            json!({"type": "array", "items": {"type": "string"}}),
        );

        if element_type.is_risk_affected() {
            properties.insert("risks".into(), risks_schema());
            properties.insert(
                "controlImplementations".into(),
                control_implementations_schema(),
            );
        }

        let mut domain_properties = Map::new();
        for domain in domains.iter().filter(|d| d.is_active()) {
            if let Some(definition) = domain.element_type_definition(element_type) {
                domain_properties.insert(domain.id().to_string(), association_schema(definition));
            }
        }
        properties.insert(
            "domains".into(),
            json!({
                "type": "object",
                "properties": domain_properties,
                "additionalProperties": false
            }),
        );

        for read_only in READ_ONLY_PROPERTIES {
            properties.insert(read_only.into(), json!({}));
        }

        json!({
            "$schema": SCHEMA_DIALECT,
            "title": element_type.singular_term(),
            "type": "object",
            "required": ["name", "owner"],
            "properties": properties,
            "additionalProperties": false
        })
    }
}

fn association_schema(definition: &ElementTypeDefinition) -> Value {
    let sub_types: Vec<&String> = definition.sub_types.keys().collect();

    // One if/then per sub type pins the status enum to that sub type.
    let status_rules: Vec<Value> = definition
        .sub_types
        .iter()
        .map(|(sub_type, sub_type_definition)| {
            json!({
                "if": {
                    "properties": {"subType": {"enum": [sub_type]}},
                    "required": ["subType"]
                },
                "then": {
                    "properties": {"status": {"enum": sub_type_definition.statuses}}
                }
            })
        })
        .collect();

    let custom_aspects: Map<String, Value> = definition
        .custom_aspects
        .iter()
        .map(|(aspect_type, aspect)| {
            (aspect_type.clone(), attributes_schema(&aspect.attribute_definitions))
        })
        .collect();

    let links: Map<String, Value> = definition
        .links
        .iter()
        .map(|(link_type, link)| (link_type.clone(), link_schema(link)))
        .collect();

    json!({
        "type": "object",
        "required": ["subType", "status"],
        "properties": {
            "subType": {"type": "string", "enum": sub_types},
            "status": {"type": "string"},
            "customAspects": {
                "type": "object",
                "properties": custom_aspects,
                "additionalProperties": false
            },
            "links": {
                "type": "object",
                "properties": links,
                "additionalProperties": false
            },
            "decisionResults": {"type": "object"}
        },
        "additionalProperties": false,
        "allOf": status_rules
    })
}

fn attributes_schema(definitions: &AttributeDefinitions) -> Value {
    let properties: Map<String, Value> = definitions
        .iter()
        .map(|(key, definition)| (key.clone(), definition.to_json_schema()))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    })
}

fn link_schema(link: &LinkDefinition) -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["target"],
            "properties": {
                "target": {"type": "string", "minLength": 1},
                "attributes": attributes_schema(&link.attribute_definitions)
            },
            "additionalProperties": false
        }
    })
}

fn risks_schema() -> Value {
    let ordinal_map = json!({"type": "object"});
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["scenario", "domain", "riskDefinition"],
            "properties": {
                "scenario": {"type": "string"},
                "domain": {"type": "string"},
                "riskDefinition": {"type": "string", "minLength": 1},
                "probability": {"type": "integer"},
                "impacts": ordinal_map,
                "residualRisks": ordinal_map
            },
            "additionalProperties": false
        }
    })
}

fn control_implementations_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["control"],
            "properties": {
                "id": {},
                "control": {"type": "string"},
                "description": {"type": "string"},
                "responsible": {"type": "string"},
                "requirementImplementations": {}
            },
            "additionalProperties": false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domains::fixtures::test_domain;
    use crate::domain::foundation::ClientId;

    #[test]
    fn asset_schema_lists_domain_sub_types_and_aspects() {
        let domain = test_domain(ClientId::new());
        let schema = ElementSchemaGenerator::generate(ElementType::Asset, &[domain.clone()]);

        let association = &schema["properties"]["domains"]["properties"][domain.id().to_string()];
        assert_eq!(association["properties"]["subType"]["enum"], json!(["AST_IT"]));
        assert_eq!(
            association["properties"]["customAspects"]["properties"]["asset_details"]["properties"]
                ["asset_details_number"],
            json!({"type": "integer"})
        );
        assert!(association["properties"]["links"]["properties"]["asset_owner"].is_object());
        assert_eq!(
            association["allOf"][0]["then"]["properties"]["status"]["enum"],
            json!(["NEW", "IN_PROGRESS", "RELEASED"])
        );
    }

    #[test]
    fn risks_only_for_risk_affected_types() {
        let domain = test_domain(ClientId::new());
        let asset = ElementSchemaGenerator::generate(ElementType::Asset, &[domain.clone()]);
        let person = ElementSchemaGenerator::generate(ElementType::Person, &[domain]);

        assert!(asset["properties"]["risks"].is_object());
        assert!(person["properties"].get("risks").is_none());
    }

    #[test]
    fn scopes_have_members_instead_of_parts() {
        let scope = ElementSchemaGenerator::generate(ElementType::Scope, &[]);
        assert!(scope["properties"].get("members").is_some());
        assert!(scope["properties"].get("parts").is_none());
    }

    #[test]
    fn inactive_domains_are_excluded() {
        let mut domain = test_domain(ClientId::new());
        domain.deactivate();
        let schema = ElementSchemaGenerator::generate(ElementType::Asset, &[domain]);
        assert_eq!(schema["properties"]["domains"]["properties"], json!({}));
    }
}
