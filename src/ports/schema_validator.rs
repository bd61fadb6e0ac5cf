//! Element schema validation port.
//!
//! Element payloads are checked against a JSON schema generated from the
//! domains of the caller's client before they are mapped onto the
//! aggregate. The port keeps the schema engine out of the use cases.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::VeoError;

/// A single failed schema keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// JSON pointer of the offending value, `""` for the document root.
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("Payload violates the element schema ({} violation(s))", .0.len())]
    Invalid(Vec<SchemaViolation>),

    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),
}

impl SchemaError {
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            SchemaError::Invalid(violations) => violations,
            SchemaError::UnsupportedSchema(_) => &[],
        }
    }
}

impl From<SchemaError> for VeoError {
    fn from(err: SchemaError) -> Self {
        match &err {
            SchemaError::Invalid(violations) => {
                let field = violations
                    .first()
                    .map(|v| v.path.clone())
                    .unwrap_or_default();
                let message = violations
                    .iter()
                    .map(|v| format!("{}: {}", display_path(&v.path), v.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                VeoError::validation(field, message)
            }
            SchemaError::UnsupportedSchema(_) => VeoError::infrastructure(err.to_string()),
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Validates JSON documents against a JSON schema.
pub trait ElementSchemaValidator: Send + Sync {
    /// # Errors
    ///
    /// - `SchemaError::Invalid` listing every violation found
    /// - `SchemaError::UnsupportedSchema` if the schema uses a construct the
    ///   implementation cannot evaluate
    fn validate(&self, schema: &Value, payload: &Value) -> Result<(), SchemaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_schema_validator_is_object_safe() {
        fn _accepts_dyn(_v: &dyn ElementSchemaValidator) {}
    }

    #[test]
    fn invalid_payload_maps_to_validation_failure() {
        let err = SchemaError::Invalid(vec![
            SchemaViolation::new("/name", "is required"),
            SchemaViolation::new("", "additional property 'foo' is not allowed"),
        ]);

        let veo: VeoError = err.into();

        assert_eq!(
            veo,
            VeoError::validation(
                "/name",
                "/name: is required; /: additional property 'foo' is not allowed"
            )
        );
    }

    #[test]
    fn unsupported_schema_is_an_infrastructure_failure() {
        let veo: VeoError = SchemaError::UnsupportedSchema("$ref".into()).into();
        assert!(matches!(veo, VeoError::Infrastructure(_)));
    }
}
