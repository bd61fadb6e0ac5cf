//! Element payloads and the context they are validated in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::domain::decision::Decider;
use crate::domain::domains::{Domain, ElementSchemaGenerator};
use crate::domain::element::{
    DomainAssociation, DomainSensitiveElementValidator, Element, ElementRisk,
};
use crate::domain::foundation::{
    ClientId, DomainId, ElementId, ElementType, UnitId, VeoError,
};
use crate::ports::{DomainRepository, ElementRepository, ElementSchemaValidator};

/// Requested implementation of a control.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlImplementationInput {
    pub control: ElementId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub responsible: Option<ElementId>,
}

/// Writable part of an element payload. Read-only properties the client
/// echoes back are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInput {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: UnitId,
    #[serde(default)]
    pub parts: BTreeSet<ElementId>,
    #[serde(default)]
    pub members: BTreeSet<ElementId>,
    #[serde(default)]
    pub domains: BTreeMap<DomainId, DomainAssociation>,
    #[serde(default)]
    pub risks: Vec<ElementRisk>,
    #[serde(default)]
    pub control_implementations: Vec<ControlImplementationInput>,
}

impl ElementInput {
    /// Checks `payload` against the schema of the client's active domains
    /// and reads it.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for schema violations or unreadable values
    pub fn parse(
        validator: &dyn ElementSchemaValidator,
        element_type: ElementType,
        domains: &[Domain],
        payload: Value,
    ) -> Result<Self, VeoError> {
        let schema = ElementSchemaGenerator::generate(element_type, domains);
        validator.validate(&schema, &payload)?;
        serde_json::from_value(payload).map_err(|e| VeoError::validation("body", e.to_string()))
    }

    /// Copies the input onto `element`. Control implementations are left
    /// to the control implementation service.
    pub fn apply_to(&self, element: &mut Element) -> Result<(BTreeSet<ElementId>, BTreeSet<ElementId>), VeoError> {
        element.rename(self.name.clone())?;
        element.set_abbreviation(self.abbreviation.clone());
        element.set_description(self.description.clone());
        element.set_owner(self.owner);
        element.set_domain_associations(self.domains.clone());
        element.set_members(self.members.clone())?;
        let changes = element.set_parts(self.parts.clone())?;
        if element.element_type().is_risk_affected() {
            element.set_risks(self.risks.clone())?;
        } else if !self.risks.is_empty() || !self.control_implementations.is_empty() {
            return Err(VeoError::unprocessable(format!(
                "{} cannot carry risks or implement controls",
                element.element_type().plural_term()
            )));
        }
        Ok(changes)
    }

    /// Ids of every element the input points at.
    pub fn references(&self) -> BTreeSet<ElementId> {
        let mut refs: BTreeSet<ElementId> = self.parts.union(&self.members).copied().collect();
        refs.extend(self.domains.values().flat_map(|a| a.link_targets()));
        refs.extend(self.risks.iter().map(|r| r.scenario));
        for ci in &self.control_implementations {
            refs.insert(ci.control);
            refs.extend(ci.responsible);
        }
        refs
    }
}

/// Domains and referenced elements needed to validate and evaluate one
/// element.
pub struct ElementContext {
    pub domains: HashMap<DomainId, Domain>,
    pub references: HashMap<ElementId, Element>,
}

impl ElementContext {
    /// Loads the client's domains and the elements `element` references.
    ///
    /// # Errors
    ///
    /// - `NotFound` if a referenced element does not exist
    /// - `ClientBoundaryViolation` if it belongs to another client
    pub async fn load(
        domains: &dyn DomainRepository,
        elements: &dyn ElementRepository,
        client_id: &ClientId,
        element: &Element,
    ) -> Result<Self, VeoError> {
        let domains = domains
            .find_by_client(client_id)
            .await?
            .into_iter()
            .map(|d| (d.id(), d))
            .collect();
        let wanted = element.referenced_elements();
        let references: HashMap<ElementId, Element> = elements
            .find_by_ids(&wanted)
            .await?
            .into_iter()
            .map(|e| (e.id(), e))
            .collect();
        for id in &wanted {
            match references.get(id) {
                None => return Err(VeoError::not_found("Element", id)),
                Some(referenced) if &referenced.client_id() != client_id => {
                    return Err(VeoError::client_boundary(id, client_id))
                }
                Some(_) => {}
            }
        }
        Ok(Self { domains, references })
    }

    pub fn validate(&self, element: &Element) -> Result<(), VeoError> {
        DomainSensitiveElementValidator::new(&self.domains, &self.references).validate(element)?;
        Ok(())
    }

    /// Stores the results of all applicable decisions on the element.
    pub fn decide(&self, element: &mut Element) {
        let associated: Vec<DomainId> = element.domains().keys().copied().collect();
        for domain_id in associated {
            if let Some(domain) = self.domains.get(&domain_id) {
                let results = Decider::decide(element, domain, &self.references);
                element.set_decision_results(&domain_id, results);
            }
        }
    }

    pub fn domain(&self, id: &DomainId) -> Option<&Domain> {
        self.domains.get(id)
    }
}
