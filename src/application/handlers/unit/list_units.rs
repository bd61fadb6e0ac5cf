//! ListUnitsHandler - units of the caller's client.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, UnitId, VeoError};
use crate::domain::unit::Unit;
use crate::ports::UnitRepository;

#[derive(Debug, Clone, Default)]
pub struct ListUnitsQuery {
    /// Only direct children of this unit.
    pub parent: Option<UnitId>,
}

pub struct ListUnitsHandler {
    units: Arc<dyn UnitRepository>,
}

impl ListUnitsHandler {
    pub fn new(units: Arc<dyn UnitRepository>) -> Self {
        Self { units }
    }

    pub async fn handle(&self, query: ListUnitsQuery, metadata: CommandMetadata) -> Result<Vec<Unit>, VeoError> {
        let rights = metadata.rights();
        let client_id = rights.require_client_id()?;
        let mut units = self
            .units
            .find_by_client(&client_id, query.parent.as_ref())
            .await?;
        if rights.is_unit_access_restricted() {
            units.retain(|u| rights.check_element_read_access(u).is_ok());
        }
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;

    #[tokio::test]
    async fn lists_children_of_parent() {
        let world = World::new().await;
        let mut child = Unit::new(UnitId::new(), world.client_id, "Child").unwrap();
        child.set_parent(Some(world.unit.id())).unwrap();
        world.units.save(&child).await.unwrap();
        let handler = ListUnitsHandler::new(world.units.clone());

        let all = handler.handle(ListUnitsQuery::default(), world.metadata()).await.unwrap();
        let children = handler
            .handle(ListUnitsQuery { parent: Some(world.unit.id()) }, world.metadata())
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), child.id());
    }

    #[tokio::test]
    async fn restricted_user_only_sees_accessible_units() {
        let world = World::new().await;
        let other = Unit::new(UnitId::new(), world.client_id, "Other").unwrap();
        world.units.save(&other).await.unwrap();

        let units = ListUnitsHandler::new(world.units.clone())
            .handle(ListUnitsQuery::default(), world.restricted(&[], &[other.id()], &[]))
            .await
            .unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id(), other.id());
    }
}
