//! Validation Adapters - Schema validation implementations.
//!
//! Contains the JSON schema validator used for element payloads.

mod json_schema_validator;

pub use json_schema_validator::JsonSchemaValidator;
