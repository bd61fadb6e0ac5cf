//! Element use cases.

mod control_implementations;
mod create_element;
mod delete_element;
mod evaluate_element;
mod get_element;
mod input;
mod query_elements;
mod removal;
mod update_element;

pub use control_implementations::ControlImplementationService;
pub(crate) use control_implementations::check_responsible;
pub use create_element::{CreateElementCommand, CreateElementHandler, CreateElementResult};
pub use delete_element::{DeleteElementCommand, DeleteElementHandler};
pub use evaluate_element::{
    EvaluateElementCommand, EvaluateElementHandler, EvaluationResult, EvaluationTarget,
};
pub use get_element::{GetElementHandler, GetElementQuery, GetElementResult};
pub use input::{ControlImplementationInput, ElementContext, ElementInput};
pub use query_elements::{QueryElementsHandler, QueryElementsQuery};
pub use removal::ElementRemover;
pub use update_element::{UpdateElementCommand, UpdateElementHandler, UpdateElementResult};

use crate::domain::element::Element;
use crate::domain::foundation::{ElementId, UserAccessRights, VeoError};
use crate::domain::unit::Unit;
use crate::ports::{ElementRepository, UnitRepository};

use super::support::{load_element, load_unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

/// Loads an element with its owner unit and checks the caller may access it.
///
/// The client check runs before the unit check, so elements of other
/// clients surface as boundary violations rather than permission errors.
pub(crate) async fn load_accessible(
    elements: &dyn ElementRepository,
    units: &dyn UnitRepository,
    rights: &UserAccessRights,
    id: &ElementId,
    access: Access,
) -> Result<(Element, Unit), VeoError> {
    let element = load_element(elements, id).await?;
    rights.check_client(&element)?;
    let unit = load_unit(units, &element.owner()).await?;
    match access {
        Access::Read => rights.check_element_read_access(&unit)?,
        Access::Write => rights.check_element_write_access(&unit)?,
    }
    Ok((element, unit))
}
