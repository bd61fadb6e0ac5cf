//! Domains module - methodology frameworks that customize elements.
//!
//! # Components
//!
//! - `Domain` - aggregate holding all per-client definitions
//! - `ElementTypeDefinition` - sub types, custom aspects, links per element type
//! - `AttributeDefinition` - typed custom attributes
//! - `RiskDefinition` - probability/impact scales and risk matrices
//! - `migrate_element` - moves an element to a successor domain
//! - `ElementSchemaGenerator` - JSON schema of element payloads

mod aggregate;
mod attribute;
mod definitions;
mod events;
mod migration;
pub mod risk_definition;
mod schema;

pub use aggregate::{ControlImplementationConfiguration, Domain};
pub use attribute::AttributeDefinition;
pub(crate) use attribute::is_uri;
pub use definitions::{
    prune_attributes, validate_attributes, AttributeDefinitions, CustomAspectDefinition, ElementTypeDefinition,
    LinkDefinition, SubTypeDefinition,
};
pub use events::{DomainContentUpdated, DomainCreated, DomainMigrated};
pub use migration::{migrate_element, ElementMigration};
pub use schema::{ElementSchemaGenerator, SCHEMA_DIALECT};
pub use risk_definition::{
    CategoryDefinition, DimensionLevel, ProbabilityDefinition, RiskDefinition, RiskValue,
};

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::json;

    use super::*;
    use crate::domain::condition::{Condition, Matcher, VeoExpression};
    use crate::domain::decision::{Decision, Rule};
    use crate::domain::foundation::{ClientId, DomainId, ElementType, TranslatedText};
    use crate::domain::inspection::{Inspection, Severity};

    fn simple(sub_types: &[&str]) -> ElementTypeDefinition {
        let mut def = ElementTypeDefinition::default();
        for sub_type in sub_types {
            def.sub_types.insert(
                (*sub_type).to_string(),
                SubTypeDefinition::new(["NEW", "IN_PROGRESS", "RELEASED"]),
            );
        }
        def
    }

    fn asset_definition() -> ElementTypeDefinition {
        serde_json::from_value(json!({
            "subTypes": {
                "AST_IT": {"statuses": ["NEW", "IN_PROGRESS", "RELEASED"]}
            },
            "customAspects": {
                "asset_details": {
                    "attributeDefinitions": {
                        "asset_details_number": {"type": "integer"},
                        "asset_tags": {"type": "list", "itemDefinition": {"type": "text"}}
                    }
                }
            },
            "links": {
                "asset_owner": {"targetType": "person", "targetSubType": "PER_Employee"}
            }
        }))
        .expect("valid asset definition")
    }

    /// Domain "DS-GVO" with one sub type per element type, an asset owner
    /// link, risk definition "DSRA", one decision, and one inspection.
    pub fn test_domain(client: ClientId) -> Domain {
        let critical = Decision {
            name: TranslatedText::of("en", "Critical asset"),
            element_type: ElementType::Asset,
            element_sub_type: "AST_IT".into(),
            rules: vec![Rule::new(Some(true), TranslatedText::of("en", "Number one")).with_condition(
                Condition::new(
                    VeoExpression::CustomAspectAttributeValue {
                        custom_aspect: "asset_details".into(),
                        attribute: "asset_details_number".into(),
                    },
                    Matcher::Equals { value: json!(1) },
                ),
            )],
            default_result_value: Some(false),
        };
        let without_parts = Inspection::new(
            Severity::Warning,
            TranslatedText::of("en", "Asset has no parts"),
            VeoExpression::Equals {
                left: Box::new(VeoExpression::PartCount { part_sub_type: None }),
                right: Box::new(VeoExpression::Constant { value: json!(0) }),
            },
        )
        .for_element(ElementType::Asset, Some("AST_IT".into()))
        .suggest_adding_part("AST_IT");

        Domain::new(DomainId::new(), client, "DS-GVO", "ISMS", "1.4.0")
            .expect("valid domain")
            .with_element_type_definition(ElementType::Asset, asset_definition())
            .with_element_type_definition(ElementType::Control, simple(&["CTL_TOM", "CTL_Requirement"]))
            .with_element_type_definition(ElementType::Document, simple(&["DOC_Contract"]))
            .with_element_type_definition(ElementType::Incident, simple(&["INC_Incident"]))
            .with_element_type_definition(ElementType::Person, simple(&["PER_Employee", "PER_External"]))
            .with_element_type_definition(ElementType::Process, simple(&["PRO_DataProcessing"]))
            .with_element_type_definition(ElementType::Scenario, simple(&["SCN_Scenario"]))
            .with_element_type_definition(ElementType::Scope, simple(&["SCP_Scope"]))
            .with_risk_definition(risk_definition::fixtures::risk_definition())
            .with_decision("asset_critical", critical)
            .with_inspection("asset_without_parts", without_parts)
            .with_control_implementation_configuration(ControlImplementationConfiguration {
                mitigation_control_sub_type: Some("CTL_TOM".into()),
                compliance_control_sub_types: vec!["CTL_Requirement".into()],
            })
    }
}
