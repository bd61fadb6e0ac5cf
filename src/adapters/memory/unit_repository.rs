use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{ClientId, DomainError, UnitId};
use crate::domain::unit::Unit;
use crate::ports::UnitRepository;

use super::{already_exists, not_found, stale};

#[derive(Default)]
pub struct InMemoryUnitRepository {
    units: RwLock<HashMap<UnitId, Unit>>,
}

impl InMemoryUnitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitRepository for InMemoryUnitRepository {
    async fn save(&self, unit: &Unit) -> Result<(), DomainError> {
        let mut units = self.units.write().await;
        if units.contains_key(&unit.id()) {
            return Err(already_exists("Unit", unit.id()));
        }
        units.insert(unit.id(), unit.clone());
        Ok(())
    }

    async fn update(&self, unit: &Unit) -> Result<(), DomainError> {
        let mut units = self.units.write().await;
        match units.get_mut(&unit.id()) {
            Some(stored) if stored.version() != unit.version() - 1 => Err(stale(
                "Unit",
                unit.id(),
                stored.version(),
                unit.version(),
            )),
            Some(stored) => {
                *stored = unit.clone();
                Ok(())
            }
            None => Err(not_found("Unit", unit.id())),
        }
    }

    async fn find_by_id(&self, id: &UnitId) -> Result<Option<Unit>, DomainError> {
        Ok(self.units.read().await.get(id).cloned())
    }

    async fn find_by_client(
        &self,
        client_id: &ClientId,
        parent: Option<&UnitId>,
    ) -> Result<Vec<Unit>, DomainError> {
        let units = self.units.read().await;
        let mut found: Vec<Unit> = units
            .values()
            .filter(|u| &u.client_id() == client_id)
            .filter(|u| parent.map_or(true, |p| u.parent_id().as_ref() == Some(p)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(found)
    }

    async fn count_by_client(&self, client_id: &ClientId) -> Result<usize, DomainError> {
        let units = self.units.read().await;
        Ok(units.values().filter(|u| &u.client_id() == client_id).count())
    }

    async fn delete(&self, id: &UnitId) -> Result<(), DomainError> {
        self.units
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Unit", id))
    }
}
