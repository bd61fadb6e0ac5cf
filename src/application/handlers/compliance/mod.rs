//! Control and requirement implementation use cases.

mod get_control_implementations;
mod get_requirement_implementations;
mod update_requirement_implementation;

pub use get_control_implementations::{
    ControlImplementationEntry, GetControlImplementationsHandler, GetControlImplementationsQuery,
};
pub use get_requirement_implementations::{
    GetRequirementImplementationHandler, GetRequirementImplementationQuery,
    GetRequirementImplementationResult, ListRequirementImplementationsHandler,
    ListRequirementImplementationsQuery,
};
pub use update_requirement_implementation::{
    UpdateRequirementImplementationCommand, UpdateRequirementImplementationHandler,
};

use serde::Serialize;

use crate::domain::element::Element;
use crate::domain::foundation::{ElementId, ElementType};

/// Reference to an element as shown next to implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub name: String,
    pub designator: String,
}

impl From<&Element> for ElementSummary {
    fn from(element: &Element) -> Self {
        Self {
            id: element.id(),
            element_type: element.element_type(),
            name: element.name().to_string(),
            designator: element.designator().to_string(),
        }
    }
}
