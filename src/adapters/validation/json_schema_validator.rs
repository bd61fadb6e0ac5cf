//! JSON Schema Validator - Implementation of ElementSchemaValidator.
//!
//! Compiles the generated element schemas with the `jsonschema` crate as
//! draft 2020-12 and reports every violation with its JSON pointer.
//! Formats (`date`, `date-time`, `uri`) are asserted, not just annotated.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::domain::domains::SCHEMA_DIALECT;
use crate::ports::{ElementSchemaValidator, SchemaError, SchemaViolation};

/// Stateless validator; share one instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self
    }

    fn compile(schema: &Value) -> Result<JSONSchema, SchemaError> {
        if let Some(dialect) = schema.get("$schema").and_then(Value::as_str) {
            if dialect != SCHEMA_DIALECT {
                return Err(SchemaError::UnsupportedSchema(format!("dialect '{}'", dialect)));
            }
        }
        JSONSchema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .compile(schema)
            .map_err(|e| SchemaError::UnsupportedSchema(e.to_string()))
    }
}

impl ElementSchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, payload: &Value) -> Result<(), SchemaError> {
        let compiled = Self::compile(schema)?;
        let result = compiled.validate(payload);
        match result {
            Ok(()) => Ok(()),
            Err(errors) => {
                let violations: Vec<SchemaViolation> = errors
                    .map(|e| SchemaViolation::new(e.instance_path.to_string(), e.to_string()))
                    .collect();
                tracing::debug!(count = violations.len(), "Payload failed schema validation");
                Err(SchemaError::Invalid(violations))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domains::fixtures::test_domain;
    use crate::domain::domains::ElementSchemaGenerator;
    use crate::domain::foundation::{ClientId, ElementType};
    use serde_json::json;

    fn validator() -> JsonSchemaValidator {
        JsonSchemaValidator::new()
    }

    fn violations(schema: &Value, payload: &Value) -> Vec<SchemaViolation> {
        match validator().validate(schema, payload) {
            Ok(()) => Vec::new(),
            Err(SchemaError::Invalid(v)) => v,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn required_and_type_violations_are_collected() {
        let schema = json!({
            "type": "object",
            "required": ["name", "owner"],
            "properties": {"name": {"type": "string"}}
        });

        let found = violations(&schema, &json!({"name": 5}));

        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|v| v.path.is_empty() && v.message.contains("owner")));
        assert!(found.iter().any(|v| v.path == "/name"));
    }

    #[test]
    fn additional_properties_false_rejects_unknown_keys() {
        let schema = json!({"type": "object", "properties": {"a": {}}, "additionalProperties": false});

        let found = violations(&schema, &json!({"a": 1, "b": 2}));

        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains('b'));
    }

    #[test]
    fn formats_and_lengths_are_checked() {
        let schema = json!({
            "type": "object",
            "properties": {
                "d": {"type": "string", "format": "date"},
                "t": {"type": "string", "format": "date-time"},
                "n": {"type": "string", "minLength": 1, "maxLength": 3}
            }
        });
        assert!(violations(
            &schema,
            &json!({"d": "2024-02-29", "t": "2024-01-01T10:00:00Z", "n": "abc"})
        )
        .is_empty());

        let found = violations(&schema, &json!({"d": "29.02.2024", "t": "yesterday", "n": ""}));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn if_then_applies_only_when_condition_holds() {
        let schema = json!({
            "allOf": [{
                "if": {"properties": {"kind": {"enum": ["a"]}}, "required": ["kind"]},
                "then": {"properties": {"status": {"enum": ["NEW"]}}}
            }]
        });
        assert!(violations(&schema, &json!({"kind": "a", "status": "NEW"})).is_empty());
        assert_eq!(violations(&schema, &json!({"kind": "a", "status": "OLD"})).len(), 1);
        assert!(violations(&schema, &json!({"kind": "b", "status": "OLD"})).is_empty());
    }

    #[test]
    fn foreign_dialects_are_unsupported() {
        let schema = json!({"$schema": "http://json-schema.org/draft-04/schema#"});
        let result = validator().validate(&schema, &json!({}));
        assert!(matches!(result, Err(SchemaError::UnsupportedSchema(_))));
    }

    #[test]
    fn generated_asset_schema_accepts_valid_payload() {
        let domain = test_domain(ClientId::new());
        let schema = ElementSchemaGenerator::generate(ElementType::Asset, &[domain.clone()]);
        let payload = json!({
            "name": "Server",
            "owner": "c9a4b3d2-0000-4000-8000-000000000001",
            "parts": [],
            "domains": {
                domain.id().to_string(): {
                    "subType": "AST_IT",
                    "status": "NEW",
                    "customAspects": {"asset_details": {"asset_details_number": 3}}
                }
            }
        });

        assert_eq!(violations(&schema, &payload), Vec::new());
    }

    #[test]
    fn generated_schema_rejects_status_of_other_sub_type() {
        let domain = test_domain(ClientId::new());
        let schema = ElementSchemaGenerator::generate(ElementType::Asset, &[domain.clone()]);
        let payload = json!({
            "name": "Server",
            "owner": "u",
            "domains": {
                domain.id().to_string(): {"subType": "AST_IT", "status": "ARCHIVED"}
            }
        });

        let found = violations(&schema, &payload);

        assert!(!found.is_empty());
        assert!(found
            .iter()
            .all(|v| v.path == format!("/domains/{}/status", domain.id())));
    }

    #[test]
    fn generated_schema_rejects_unknown_custom_aspect_attribute() {
        let domain = test_domain(ClientId::new());
        let schema = ElementSchemaGenerator::generate(ElementType::Asset, &[domain.clone()]);
        let payload = json!({
            "name": "Server",
            "owner": "u",
            "domains": {
                domain.id().to_string(): {
                    "subType": "AST_IT",
                    "status": "NEW",
                    "customAspects": {"asset_details": {"colour": "red"}}
                }
            }
        });

        assert_eq!(violations(&schema, &payload).len(), 1);
    }
}
