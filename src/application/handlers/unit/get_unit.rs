//! GetUnitHandler

use std::sync::Arc;

use crate::application::handlers::support::{load_unit, ETagSalt};
use crate::domain::foundation::{CommandMetadata, UnitId, VeoError};
use crate::domain::unit::Unit;
use crate::ports::UnitRepository;

#[derive(Debug, Clone)]
pub struct GetUnitQuery {
    pub unit_id: UnitId,
}

#[derive(Debug, Clone)]
pub struct GetUnitResult {
    pub unit: Unit,
    pub etag: String,
}

pub struct GetUnitHandler {
    units: Arc<dyn UnitRepository>,
    salt: ETagSalt,
}

impl GetUnitHandler {
    pub fn new(units: Arc<dyn UnitRepository>, salt: ETagSalt) -> Self {
        Self { units, salt }
    }

    pub async fn handle(&self, query: GetUnitQuery, metadata: CommandMetadata) -> Result<GetUnitResult, VeoError> {
        let unit = load_unit(self.units.as_ref(), &query.unit_id).await?;
        metadata.rights().check_element_read_access(&unit)?;
        let etag = self.salt.etag(&unit.id(), unit.version());
        Ok(GetUnitResult { unit, etag })
    }
}
