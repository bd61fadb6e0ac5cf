//! Requirement implementation lookups.

use std::sync::Arc;

use crate::application::handlers::element::{load_accessible, Access};
use crate::application::handlers::support::ETagSalt;
use crate::domain::element::RequirementImplementation;
use crate::domain::foundation::{CommandMetadata, ElementId, VeoError};
use crate::ports::{ElementRepository, PageRequest, PagedResult, UnitRepository};

/// Requirement implementations belonging to one control implementation.
#[derive(Debug, Clone)]
pub struct ListRequirementImplementationsQuery {
    pub origin_id: ElementId,
    /// Control of the control implementation.
    pub control_id: ElementId,
    pub page: PageRequest,
}

pub struct ListRequirementImplementationsHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
}

impl ListRequirementImplementationsHandler {
    pub fn new(units: Arc<dyn UnitRepository>, elements: Arc<dyn ElementRepository>) -> Self {
        Self { units, elements }
    }

    pub async fn handle(
        &self,
        query: ListRequirementImplementationsQuery,
        metadata: CommandMetadata,
    ) -> Result<PagedResult<RequirementImplementation>, VeoError> {
        let (origin, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            metadata.rights(),
            &query.origin_id,
            Access::Read,
        )
        .await?;
        let ci = origin
            .control_implementation(&query.control_id)
            .ok_or_else(|| VeoError::not_found("Control implementation", query.control_id))?;
        let items: Vec<RequirementImplementation> = origin
            .requirement_implementations()
            .iter()
            .filter(|ri| ci.requirement_implementations.contains(&ri.id))
            .cloned()
            .collect();
        Ok(query.page.apply(items))
    }
}

#[derive(Debug, Clone)]
pub struct GetRequirementImplementationQuery {
    pub origin_id: ElementId,
    pub control_id: ElementId,
}

#[derive(Debug, Clone)]
pub struct GetRequirementImplementationResult {
    pub requirement_implementation: RequirementImplementation,
    pub etag: String,
}

pub struct GetRequirementImplementationHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    salt: ETagSalt,
}

impl GetRequirementImplementationHandler {
    pub fn new(units: Arc<dyn UnitRepository>, elements: Arc<dyn ElementRepository>, salt: ETagSalt) -> Self {
        Self { units, elements, salt }
    }

    pub async fn handle(
        &self,
        query: GetRequirementImplementationQuery,
        metadata: CommandMetadata,
    ) -> Result<GetRequirementImplementationResult, VeoError> {
        let (origin, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            metadata.rights(),
            &query.origin_id,
            Access::Read,
        )
        .await?;
        let ri = origin
            .requirement_implementation(&query.control_id)
            .cloned()
            .ok_or_else(|| VeoError::not_found("Requirement implementation", query.control_id))?;
        let etag = self.salt.etag(&ri.id, ri.version);
        Ok(GetRequirementImplementationResult {
            requirement_implementation: ri,
            etag,
        })
    }
}
