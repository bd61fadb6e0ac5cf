//! GetElementHandler - single element lookup with unit read check.

use std::sync::Arc;

use crate::application::handlers::support::ETagSalt;
use crate::domain::element::Element;
use crate::domain::foundation::{CommandMetadata, ElementId, VeoError};
use crate::ports::{ElementRepository, UnitRepository};

use super::{load_accessible, Access};

#[derive(Debug, Clone)]
pub struct GetElementQuery {
    pub element_id: ElementId,
}

#[derive(Debug, Clone)]
pub struct GetElementResult {
    pub element: Element,
    pub etag: String,
}

pub struct GetElementHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    salt: ETagSalt,
}

impl GetElementHandler {
    pub fn new(units: Arc<dyn UnitRepository>, elements: Arc<dyn ElementRepository>, salt: ETagSalt) -> Self {
        Self { units, elements, salt }
    }

    pub async fn handle(
        &self,
        query: GetElementQuery,
        metadata: CommandMetadata,
    ) -> Result<GetElementResult, VeoError> {
        let (element, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            metadata.rights(),
            &query.element_id,
            Access::Read,
        )
        .await?;
        let etag = self.salt.etag(&element.id(), element.version());
        Ok(GetElementResult { element, etag })
    }
}
