//! MigrateDomainHandler - moves a client's elements from an old domain
//! version to its successor and retires the old one.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::handlers::support::{publish, require_admin};
use crate::domain::domains::{migrate_element, Domain, DomainMigrated, ElementMigration};
use crate::domain::element::Element;
use crate::domain::foundation::{
    CommandMetadata, DomainId, ElementId, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::domain::unit::Unit;
use crate::ports::{DomainRepository, ElementRepository, EventPublisher, UnitRepository};

#[derive(Debug, Clone)]
pub struct MigrateDomainCommand {
    /// The new domain version.
    pub domain_id: DomainId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated { old_domain_id: DomainId, migrated_elements: usize },
    /// The client does not have exactly one predecessor of the domain.
    Skipped,
}

pub struct MigrateDomainHandler {
    domains: Arc<dyn DomainRepository>,
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl MigrateDomainHandler {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        units: Arc<dyn UnitRepository>,
        elements: Arc<dyn ElementRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            domains,
            units,
            elements,
            event_publisher,
        }
    }

    /// # Errors
    ///
    /// - `MissingAdminPrivileges` for non-admin callers
    /// - `NotFound` if the new domain does not exist
    /// - `MigrationFailed` if elements of at least one unit could not be
    ///   migrated; the old domain then stays active. Only units holding
    ///   elements of the old domain count towards the total.
    pub async fn handle(
        &self,
        cmd: MigrateDomainCommand,
        metadata: CommandMetadata,
    ) -> Result<MigrationOutcome, VeoError> {
        require_admin(&metadata)?;
        let mut new = self
            .domains
            .find_by_id(&cmd.domain_id)
            .await?
            .ok_or_else(|| VeoError::not_found("Domain", cmd.domain_id))?;
        let client_id = new.client_id();

        let same_name: Vec<Domain> = self
            .domains
            .find_active_by_client(&client_id)
            .await?
            .into_iter()
            .filter(|d| d.name() == new.name())
            .collect();
        if same_name.len() != 2 {
            warn!(
                client_id = %client_id,
                domain = new.name(),
                found = same_name.len(),
                "Skipping client, expected exactly two active versions of the domain"
            );
            return Ok(MigrationOutcome::Skipped);
        }
        let Some(mut old) = same_name.into_iter().find(|d| d.id() != new.id()) else {
            return Ok(MigrationOutcome::Skipped);
        };

        let customized = new.apply_risk_customizations(&old);
        if !customized.is_empty() {
            info!(domain_id = %new.id(), risk_definitions = ?customized, "Copied risk customizations");
            new.touch();
            self.domains.update(&new).await?;
        }

        let mut affected: Vec<(Unit, Vec<Element>)> = Vec::new();
        let mut idle: Vec<Unit> = Vec::new();
        for unit in self.units.find_by_client(&client_id, None).await? {
            let elements: Vec<Element> = self
                .elements
                .find_by_unit(&unit.id())
                .await?
                .into_iter()
                .filter(|e| e.is_associated_with(&old.id()))
                .collect();
            if !elements.is_empty() {
                affected.push((unit, elements));
            } else if unit.domains().contains(&old.id()) {
                idle.push(unit);
            }
        }

        let total = affected.len();
        let mut failures = 0;
        let mut migrated_elements = 0;
        for (unit, elements) in affected {
            match self.migrate_unit(unit, elements, &old, &new, &metadata).await? {
                Some(count) => migrated_elements += count,
                None => failures += 1,
            }
        }
        if failures > 0 {
            return Err(VeoError::MigrationFailed { total, failures });
        }
        for unit in idle {
            self.switch_unit_domain(unit, &old, &new).await?;
        }

        old.deactivate();
        old.touch();
        self.domains.update(&old).await?;
        info!(
            client_id = %client_id,
            old_domain_id = %old.id(),
            domain_id = %new.id(),
            migrated_elements,
            "Domain migrated"
        );

        let event = DomainMigrated {
            event_id: EventId::new(),
            domain_id: new.id(),
            old_domain_id: old.id(),
            client_id,
            migrated_elements,
            migrated_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        Ok(MigrationOutcome::Migrated {
            old_domain_id: old.id(),
            migrated_elements,
        })
    }

    /// Migrates the old-domain elements of one unit, or none of them.
    /// Returns the number of elements transferred, or `None` if an element
    /// could not be migrated.
    async fn migrate_unit(
        &self,
        unit: Unit,
        mut elements: Vec<Element>,
        old: &Domain,
        new: &Domain,
        metadata: &CommandMetadata,
    ) -> Result<Option<usize>, VeoError> {
        let resolver = self.resolver(&elements).await?;
        let mut transferred = 0;
        let mut removed = 0;
        for element in &mut elements {
            match migrate_element(element, old, new, &resolver) {
                Ok(ElementMigration::Transferred) => transferred += 1,
                Ok(ElementMigration::RemovedFromDomain) => removed += 1,
                Err(e) => {
                    warn!(unit_id = %unit.id(), element_id = %element.id(), error = %e, "Element migration failed");
                    return Ok(None);
                }
            }
            element.touch(metadata.user_id());
        }
        for element in &elements {
            self.elements.update(element).await?;
        }
        debug!(unit_id = %unit.id(), transferred, removed, "Unit migrated");

        self.switch_unit_domain(unit, old, new).await?;
        Ok(Some(transferred))
    }

    /// The unit's elements together with everything they reference.
    async fn resolver(&self, elements: &[Element]) -> Result<HashMap<ElementId, Element>, VeoError> {
        let mut known: HashMap<ElementId, Element> =
            elements.iter().map(|e| (e.id(), e.clone())).collect();
        let missing: BTreeSet<ElementId> = elements
            .iter()
            .flat_map(|e| e.referenced_elements())
            .filter(|id| !known.contains_key(id))
            .collect();
        if !missing.is_empty() {
            for e in self.elements.find_by_ids(&missing).await? {
                known.insert(e.id(), e);
            }
        }
        Ok(known)
    }

    async fn switch_unit_domain(&self, mut unit: Unit, old: &Domain, new: &Domain) -> Result<(), VeoError> {
        if !unit.domains().contains(&old.id()) {
            return Ok(());
        }
        unit.remove_domain(&old.id());
        unit.add_domain(new.id());
        unit.touch();
        self.units.update(&unit).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::domains::fixtures::test_domain;
    use crate::domain::element::DomainAssociation;
    use crate::domain::foundation::{ElementType, UnitId};
    use serde_json::json;

    fn handler(world: &World) -> MigrateDomainHandler {
        MigrateDomainHandler::new(
            world.domains.clone(),
            world.units.clone(),
            world.elements.clone(),
            world.bus.clone(),
        )
    }

    async fn successor(world: &World) -> Domain {
        let new = test_domain(world.client_id);
        world.domains.save(&new).await.unwrap();
        new
    }

    #[tokio::test]
    async fn moves_elements_and_deactivates_old_domain() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;
        let new = successor(&world).await;

        let outcome = handler(&world)
            .handle(MigrateDomainCommand { domain_id: new.id() }, world.admin())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                old_domain_id: world.domain.id(),
                migrated_elements: 1
            }
        );
        let person = world.reload(&person).await;
        assert!(person.is_associated_with(&new.id()));
        assert!(!person.is_associated_with(&world.domain.id()));
        let old = world.domains.find_by_id(&world.domain.id()).await.unwrap().unwrap();
        assert!(!old.is_active());
        assert_eq!(world.event_types(), vec!["domain.migrated.v1"]);
    }

    #[tokio::test]
    async fn single_version_is_skipped() {
        let world = World::new().await;

        let outcome = handler(&world)
            .handle(MigrateDomainCommand { domain_id: world.domain.id() }, world.admin())
            .await
            .unwrap();

        assert_eq!(outcome, MigrationOutcome::Skipped);
    }

    #[tokio::test]
    async fn obsolete_sub_type_removes_element_from_domain() {
        let world = World::new().await;
        let mut legacy = world.add_element(ElementType::Person, "PER_Employee").await;
        legacy.associate_with_domain(world.domain.id(), DomainAssociation::new("PER_Legacy", "NEW"));
        world.store(&mut legacy).await;
        let new = successor(&world).await;

        let outcome = handler(&world)
            .handle(MigrateDomainCommand { domain_id: new.id() }, world.admin())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                old_domain_id: world.domain.id(),
                migrated_elements: 0
            }
        );
        let legacy = world.reload(&legacy).await;
        assert!(legacy.domains().is_empty());
        let old = world.domains.find_by_id(&world.domain.id()).await.unwrap().unwrap();
        assert!(!old.is_active());
    }

    #[tokio::test]
    async fn obsolete_status_and_invalid_attributes_are_repaired() {
        let world = World::new().await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        let attributes = json!({"asset_details_number": "not a number"});
        asset.associate_with_domain(
            world.domain.id(),
            DomainAssociation::new("AST_IT", "RETIRED_STATUS")
                .with_custom_aspect("asset_details", attributes.as_object().unwrap().clone()),
        );
        world.store(&mut asset).await;
        let new = successor(&world).await;

        handler(&world)
            .handle(MigrateDomainCommand { domain_id: new.id() }, world.admin())
            .await
            .unwrap();

        let asset = world.reload(&asset).await;
        assert_eq!(asset.status(&new.id()), Some("NEW"));
        assert!(asset.association(&new.id()).unwrap().custom_aspects["asset_details"].is_empty());
        assert_eq!(asset.version(), 2);
    }

    #[tokio::test]
    async fn failure_counts_only_units_with_old_domain_elements() {
        let world = World::new().await;
        let new = successor(&world).await;
        let empty = Unit::new(UnitId::new(), world.client_id, "Empty").unwrap();
        world.units.save(&empty).await.unwrap();
        let mut both = world.add_element(ElementType::Person, "PER_Employee").await;
        both.associate_with_domain(new.id(), DomainAssociation::new("PER_Employee", "NEW"));
        world.store(&mut both).await;

        let result = handler(&world)
            .handle(MigrateDomainCommand { domain_id: new.id() }, world.admin())
            .await;

        assert_eq!(result.unwrap_err(), VeoError::MigrationFailed { total: 1, failures: 1 });
        let old = world.domains.find_by_id(&world.domain.id()).await.unwrap().unwrap();
        assert!(old.is_active());
        assert!(world.reload(&both).await.is_associated_with(&world.domain.id()));
    }

    #[tokio::test]
    async fn requires_admin() {
        let world = World::new().await;
        let new = successor(&world).await;

        let result = handler(&world)
            .handle(MigrateDomainCommand { domain_id: new.id() }, world.metadata())
            .await;

        assert_eq!(result.unwrap_err(), VeoError::MissingAdminPrivileges);
    }
}
