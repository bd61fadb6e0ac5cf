//! Control and requirement implementations.
//!
//! A risk-affected element implements a control through a
//! `ControlImplementation`. Each control it covers (the control itself plus
//! all of its parts, recursively) gets a `RequirementImplementation` that
//! records how far that requirement is fulfilled.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ControlImplementationId, ElementId, RequirementImplementationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplementationStatus {
    Yes,
    No,
    Partial,
    #[serde(rename = "N_A")]
    NotApplicable,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origination {
    #[default]
    SystemSpecific,
    Inherited,
}

/// Why a control is implemented, resolved to sub types via the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlImplementationPurpose {
    Mitigation,
    Compliance,
}

impl ControlImplementationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlImplementationPurpose::Mitigation => "mitigation",
            ControlImplementationPurpose::Compliance => "compliance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlImplementation {
    pub id: ControlImplementationId,
    pub control: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<ElementId>,
    /// Requirement implementations this CI is made of.
    pub requirement_implementations: BTreeSet<RequirementImplementationId>,
}

impl ControlImplementation {
    pub fn new(control: ElementId) -> Self {
        Self {
            id: ControlImplementationId::new(),
            control,
            description: None,
            responsible: None,
            requirement_implementations: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementImplementation {
    pub id: RequirementImplementationId,
    pub control: ElementId,
    #[serde(default)]
    pub origination: Origination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<ElementId>,
    #[serde(default)]
    pub status: ImplementationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_statement: Option<String>,
    #[serde(default)]
    pub version: i64,
}

impl RequirementImplementation {
    pub fn new(control: ElementId) -> Self {
        Self {
            id: RequirementImplementationId::new(),
            control,
            origination: Origination::SystemSpecific,
            responsible: None,
            status: ImplementationStatus::Unknown,
            implementation_statement: None,
            version: 0,
        }
    }

    /// True if nobody has touched this requirement since it was generated.
    pub fn is_unedited(&self) -> bool {
        self.implementation_statement.is_none()
            && self.origination == Origination::SystemSpecific
            && self.responsible.is_none()
            && self.status == ImplementationStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_requirement_is_unedited() {
        let mut ri = RequirementImplementation::new(ElementId::new());
        assert!(ri.is_unedited());
        ri.status = ImplementationStatus::Partial;
        assert!(!ri.is_unedited());
    }

    #[test]
    fn status_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ImplementationStatus::NotApplicable).unwrap(),
            "\"N_A\""
        );
        assert_eq!(
            serde_json::to_string(&Origination::SystemSpecific).unwrap(),
            "\"SYSTEM_SPECIFIC\""
        );
        let purpose: ControlImplementationPurpose = serde_json::from_str("\"MITIGATION\"").unwrap();
        assert_eq!(purpose, ControlImplementationPurpose::Mitigation);
    }
}
