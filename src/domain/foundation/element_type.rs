//! Element types and their naming conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Kind of a GRC element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Asset,
    Control,
    Document,
    Incident,
    Person,
    Process,
    Scenario,
    Scope,
}

impl ElementType {
    pub const ALL: [ElementType; 8] = [
        ElementType::Asset,
        ElementType::Control,
        ElementType::Document,
        ElementType::Incident,
        ElementType::Person,
        ElementType::Process,
        ElementType::Scenario,
        ElementType::Scope,
    ];

    pub fn singular_term(&self) -> &'static str {
        match self {
            ElementType::Asset => "asset",
            ElementType::Control => "control",
            ElementType::Document => "document",
            ElementType::Incident => "incident",
            ElementType::Person => "person",
            ElementType::Process => "process",
            ElementType::Scenario => "scenario",
            ElementType::Scope => "scope",
        }
    }

    pub fn plural_term(&self) -> &'static str {
        match self {
            ElementType::Asset => "assets",
            ElementType::Control => "controls",
            ElementType::Document => "documents",
            ElementType::Incident => "incidents",
            ElementType::Person => "persons",
            ElementType::Process => "processes",
            ElementType::Scenario => "scenarios",
            ElementType::Scope => "scopes",
        }
    }

    /// Prefix of generated designators, e.g. `AST-12`.
    pub fn designator_prefix(&self) -> &'static str {
        match self {
            ElementType::Asset => "AST",
            ElementType::Control => "CTL",
            ElementType::Document => "DOC",
            ElementType::Incident => "INC",
            ElementType::Person => "PER",
            ElementType::Process => "PRO",
            ElementType::Scenario => "SCN",
            ElementType::Scope => "SCP",
        }
    }

    /// Types that carry risks and implement controls.
    pub fn is_risk_affected(&self) -> bool {
        matches!(
            self,
            ElementType::Asset | ElementType::Process | ElementType::Scope
        )
    }

    /// Types whose modification may change computed risks.
    pub fn affects_risk(&self) -> bool {
        matches!(
            self,
            ElementType::Process
                | ElementType::Asset
                | ElementType::Scope
                | ElementType::Scenario
                | ElementType::Control
        )
    }

    /// Types that can have parts of their own type.
    pub fn is_composite(&self) -> bool {
        !matches!(self, ElementType::Scope)
    }

    /// Parses either the singular or the plural term.
    pub fn from_term(term: &str) -> Result<Self, ValidationError> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.singular_term() == term || t.plural_term() == term)
            .ok_or_else(|| {
                ValidationError::invalid_format("elementType", format!("unknown type '{}'", term))
            })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.singular_term())
    }
}

impl FromStr for ElementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_term(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_and_plural_terms() {
        assert_eq!("process".parse::<ElementType>().unwrap(), ElementType::Process);
        assert_eq!("processes".parse::<ElementType>().unwrap(), ElementType::Process);
        assert!("widget".parse::<ElementType>().is_err());
    }

    #[test]
    fn risk_affected_types_are_asset_process_scope() {
        let affected: Vec<_> = ElementType::ALL
            .iter()
            .filter(|t| t.is_risk_affected())
            .collect();
        assert_eq!(
            affected,
            vec![&ElementType::Asset, &ElementType::Process, &ElementType::Scope]
        );
    }

    #[test]
    fn scenario_and_control_affect_risk() {
        assert!(ElementType::Scenario.affects_risk());
        assert!(ElementType::Control.affects_risk());
        assert!(!ElementType::Person.affects_risk());
        assert!(!ElementType::Document.affects_risk());
    }

    #[test]
    fn serializes_as_camel_case_term() {
        assert_eq!(serde_json::to_string(&ElementType::Scope).unwrap(), "\"scope\"");
    }
}
