//! Domain aggregate.
//!
//! A domain is a client's copy of a methodology (e.g. ISO 27001, GDPR). It
//! defines the shape of elements per type, the risk definitions used to
//! assess them, and the decisions and inspections evaluated on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::decision::Decision;
use crate::domain::element::ControlImplementationPurpose;
use crate::domain::foundation::{
    ClientId, ClientOwned, DomainError, DomainId, ElementType, ErrorCode, Timestamp,
};
use crate::domain::inspection::Inspection;

use super::{ElementTypeDefinition, RiskDefinition};

/// Control sub types used for risk mitigation and compliance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlImplementationConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_control_sub_type: Option<String>,
    #[serde(default)]
    pub compliance_control_sub_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    id: DomainId,
    client_id: ClientId,
    name: String,
    abbreviation: Option<String>,
    description: Option<String>,
    authority: String,
    template_version: String,
    active: bool,
    element_type_definitions: BTreeMap<ElementType, ElementTypeDefinition>,
    risk_definitions: BTreeMap<String, RiskDefinition>,
    decisions: BTreeMap<String, Decision>,
    inspections: BTreeMap<String, Inspection>,
    control_implementation_configuration: ControlImplementationConfiguration,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Domain {
    /// Create an active domain without definitions.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if name or authority is empty
    pub fn new(
        id: DomainId,
        client_id: ClientId,
        name: impl Into<String>,
        authority: impl Into<String>,
        template_version: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let authority = authority.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "Domain name cannot be empty"));
        }
        if authority.trim().is_empty() {
            return Err(DomainError::validation("authority", "Authority cannot be empty"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id,
            client_id,
            name,
            abbreviation: None,
            description: None,
            authority,
            template_version: template_version.into(),
            active: true,
            element_type_definitions: BTreeMap::new(),
            risk_definitions: BTreeMap::new(),
            decisions: BTreeMap::new(),
            inspections: BTreeMap::new(),
            control_implementation_configuration: ControlImplementationConfiguration::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_element_type_definition(
        mut self,
        element_type: ElementType,
        definition: ElementTypeDefinition,
    ) -> Self {
        self.element_type_definitions.insert(element_type, definition);
        self
    }

    pub fn with_risk_definition(mut self, definition: RiskDefinition) -> Self {
        self.risk_definitions.insert(definition.id.clone(), definition);
        self
    }

    pub fn with_decision(mut self, key: impl Into<String>, decision: Decision) -> Self {
        self.decisions.insert(key.into(), decision);
        self
    }

    pub fn with_inspection(mut self, key: impl Into<String>, inspection: Inspection) -> Self {
        self.inspections.insert(key.into(), inspection);
        self
    }

    pub fn with_control_implementation_configuration(
        mut self,
        configuration: ControlImplementationConfiguration,
    ) -> Self {
        self.control_implementation_configuration = configuration;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn template_version(&self) -> &str {
        &self.template_version
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn element_type_definitions(&self) -> &BTreeMap<ElementType, ElementTypeDefinition> {
        &self.element_type_definitions
    }

    pub fn element_type_definition(&self, element_type: ElementType) -> Option<&ElementTypeDefinition> {
        self.element_type_definitions.get(&element_type)
    }

    pub fn risk_definitions(&self) -> &BTreeMap<String, RiskDefinition> {
        &self.risk_definitions
    }

    pub fn risk_definition(&self, id: &str) -> Option<&RiskDefinition> {
        self.risk_definitions.get(id)
    }

    pub fn decisions(&self) -> &BTreeMap<String, Decision> {
        &self.decisions
    }

    pub fn decision(&self, key: &str) -> Option<&Decision> {
        self.decisions.get(key)
    }

    pub fn inspections(&self) -> &BTreeMap<String, Inspection> {
        &self.inspections
    }

    pub fn control_implementation_configuration(&self) -> &ControlImplementationConfiguration {
        &self.control_implementation_configuration
    }

    /// Control sub types that serve `purpose`.
    ///
    /// # Errors
    ///
    /// - `Unprocessable` if the domain configures none
    pub fn control_sub_types(
        &self,
        purpose: ControlImplementationPurpose,
    ) -> Result<Vec<String>, DomainError> {
        let config = &self.control_implementation_configuration;
        let sub_types: Vec<String> = match purpose {
            ControlImplementationPurpose::Mitigation => {
                config.mitigation_control_sub_type.iter().cloned().collect()
            }
            ControlImplementationPurpose::Compliance => config.compliance_control_sub_types.clone(),
        };
        if sub_types.is_empty() {
            let noun = match purpose {
                ControlImplementationPurpose::Mitigation => "sub type",
                ControlImplementationPurpose::Compliance => "sub types",
            };
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                format!("No {} control {} configured in domain.", purpose.as_str(), noun),
            ));
        }
        Ok(sub_types)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authoring
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces the definition of `element_type`.
    pub fn set_element_type_definition(
        &mut self,
        element_type: ElementType,
        definition: ElementTypeDefinition,
    ) {
        self.element_type_definitions.insert(element_type, definition);
    }

    /// Inserts or replaces a decision. Returns true if it replaced one.
    pub fn put_decision(&mut self, key: impl Into<String>, decision: Decision) -> bool {
        self.decisions.insert(key.into(), decision).is_some()
    }

    pub fn remove_decision(&mut self, key: &str) -> Option<Decision> {
        self.decisions.remove(key)
    }

    /// Inserts or replaces an inspection. Returns true if it replaced one.
    pub fn put_inspection(&mut self, key: impl Into<String>, inspection: Inspection) -> bool {
        self.inspections.insert(key.into(), inspection).is_some()
    }

    pub fn remove_inspection(&mut self, key: &str) -> Option<Inspection> {
        self.inspections.remove(key)
    }

    /// Inserts or replaces the risk definition with the same id. Returns
    /// true if it replaced one.
    pub fn put_risk_definition(&mut self, definition: RiskDefinition) -> bool {
        self.risk_definitions
            .insert(definition.id.clone(), definition)
            .is_some()
    }

    /// Copies risk definitions from `old` that differ from this domain's.
    ///
    /// Impact-inheriting links are restricted to link types this domain
    /// defines. Returns the ids of the copied definitions.
    pub fn apply_risk_customizations(&mut self, old: &Domain) -> Vec<String> {
        let mut copied = Vec::new();
        for (id, definition) in &old.risk_definitions {
            if self.risk_definitions.get(id) == Some(definition) {
                continue;
            }
            let restricted = definition.restricted_to_links(&self.element_type_definitions);
            self.risk_definitions.insert(id.clone(), restricted);
            copied.push(id.clone());
        }
        copied
    }

    /// Checks risk definitions, decisions, and inspections for consistency.
    ///
    /// # Errors
    ///
    /// - the first inconsistency found
    pub fn validate(&self) -> Result<(), DomainError> {
        for definition in self.risk_definitions.values() {
            definition.validate(&self.element_type_definitions)?;
        }
        for decision in self.decisions.values() {
            decision.validate(self)?;
        }
        for inspection in self.inspections.values() {
            inspection.validate(self)?;
        }
        Ok(())
    }

    /// Records a modification, bumping the version. Called once per
    /// persisted change.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Timestamp::now();
    }
}

impl ClientOwned for Domain {
    fn owning_client(&self) -> Option<ClientId> {
        Some(self.client_id)
    }

    fn resource_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::domains::fixtures::test_domain;
    use crate::domain::domains::risk_definition::fixtures::risk_definition;

    #[test]
    fn new_rejects_blank_name() {
        assert!(Domain::new(DomainId::new(), ClientId::new(), " ", "ISO", "1.0").is_err());
        assert!(Domain::new(DomainId::new(), ClientId::new(), "DS-GVO", "", "1.0").is_err());
    }

    #[test]
    fn mutations_leave_version_to_touch() {
        let mut domain = test_domain(ClientId::new());
        domain.deactivate();
        domain.remove_decision("asset_critical");
        assert!(!domain.is_active());
        assert_eq!(domain.version(), 0);
        domain.touch();
        assert_eq!(domain.version(), 1);
    }

    #[test]
    fn authoring_replaces_and_removes_definitions() {
        let mut domain = test_domain(ClientId::new());
        let decision = domain.decision("asset_critical").unwrap().clone();

        assert!(domain.put_decision("asset_critical", decision.clone()));
        assert!(!domain.put_decision("asset_copy", decision));
        assert!(domain.remove_decision("asset_copy").is_some());
        assert!(domain.remove_inspection("asset_without_parts").is_some());
        assert!(domain.remove_inspection("asset_without_parts").is_none());

        let mut definition = risk_definition();
        definition.id = "GHB".into();
        assert!(!domain.put_risk_definition(definition));
        assert_eq!(domain.risk_definitions().len(), 2);

        domain.set_element_type_definition(ElementType::Asset, ElementTypeDefinition::default());
        assert!(domain
            .element_type_definition(ElementType::Asset)
            .unwrap()
            .sub_types
            .is_empty());
    }

    #[test]
    fn control_sub_types_by_purpose() {
        let domain = test_domain(ClientId::new());
        assert_eq!(
            domain.control_sub_types(ControlImplementationPurpose::Mitigation).unwrap(),
            vec!["CTL_TOM".to_string()]
        );
        assert_eq!(
            domain.control_sub_types(ControlImplementationPurpose::Compliance).unwrap(),
            vec!["CTL_Requirement".to_string()]
        );
    }

    #[test]
    fn missing_control_configuration_is_unprocessable() {
        let domain = Domain::new(DomainId::new(), ClientId::new(), "D", "A", "1").unwrap();
        let err = domain
            .control_sub_types(ControlImplementationPurpose::Mitigation)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unprocessable);
        assert_eq!(err.message, "No mitigation control sub type configured in domain.");
        let err = domain
            .control_sub_types(ControlImplementationPurpose::Compliance)
            .unwrap_err();
        assert_eq!(err.message, "No compliance control sub types configured in domain.");
    }

    #[test]
    fn risk_customizations_copy_changed_definitions_only() {
        let client = ClientId::new();
        let mut old = test_domain(client);
        let mut new = test_domain(client);
        assert!(new.apply_risk_customizations(&old).is_empty());

        let mut custom = risk_definition();
        custom.risk_values[0].symbolic_risk = "negligible".into();
        custom
            .impact_inheriting_links
            .insert(ElementType::Asset, vec!["asset_owner".into(), "gone".into()]);
        custom
            .impact_inheriting_links
            .insert(ElementType::Process, vec!["gone".into()]);
        old = old.with_risk_definition(custom);

        let copied = new.apply_risk_customizations(&old);

        assert_eq!(copied, vec!["DSRA".to_string()]);
        let copied = new.risk_definition("DSRA").unwrap();
        assert_eq!(copied.risk_values[0].symbolic_risk, "negligible");
        assert_eq!(
            copied.impact_inheriting_links,
            BTreeMap::from([(ElementType::Asset, vec!["asset_owner".to_string()])])
        );
    }

    #[test]
    fn fixture_domain_is_consistent() {
        assert!(test_domain(ClientId::new()).validate().is_ok());
    }

    #[test]
    fn survives_json_round_trip() {
        let domain = test_domain(ClientId::new());
        let json = serde_json::to_value(&domain).unwrap();
        let back: Domain = serde_json::from_value(json).unwrap();
        assert_eq!(back, domain);
    }
}
