//! DeleteUnitHandler - deletes a unit, its sub units, and their elements.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::element::ElementRemover;
use crate::application::handlers::support::{load_unit, publish};
use crate::domain::foundation::{
    CommandMetadata, EventEnvelope, EventId, SerializableDomainEvent, Timestamp, UnitId, VeoError,
};
use crate::domain::unit::{Unit, UnitDeleted};
use crate::ports::{ElementRepository, EventPublisher, UnitRepository};

#[derive(Debug, Clone)]
pub struct DeleteUnitCommand {
    pub unit_id: UnitId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUnitResult {
    pub deleted_units: usize,
    pub deleted_elements: usize,
}

pub struct DeleteUnitHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl DeleteUnitHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        elements: Arc<dyn ElementRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            units,
            elements,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: DeleteUnitCommand,
        metadata: CommandMetadata,
    ) -> Result<DeleteUnitResult, VeoError> {
        let rights = metadata.rights();
        rights.check_unit_delete_allowed()?;
        let unit = load_unit(self.units.as_ref(), &cmd.unit_id).await?;
        rights.check_client(&unit)?;

        let tree = self.collect_tree(unit).await?;
        let remover = ElementRemover::new(self.elements.clone());
        let mut events: Vec<EventEnvelope> = Vec::new();
        let mut deleted_elements = 0;

        // Children come after their parents in `tree`; delete bottom-up.
        for unit in tree.iter().rev() {
            let elements = self.elements.find_by_unit(&unit.id()).await?;
            let count = elements.len();
            for element in &elements {
                events.extend(remover.remove(element, &metadata).await?);
            }
            self.units.delete(&unit.id()).await?;
            deleted_elements += count;
            events.push(
                UnitDeleted {
                    event_id: EventId::new(),
                    unit_id: unit.id(),
                    client_id: unit.client_id(),
                    deleted_elements: count,
                    deleted_at: Timestamp::now(),
                }
                .to_envelope(),
            );
        }

        info!(
            unit_id = %cmd.unit_id,
            deleted_units = tree.len(),
            deleted_elements,
            "Unit deleted"
        );
        publish(self.event_publisher.as_ref(), &metadata, events).await?;

        Ok(DeleteUnitResult {
            deleted_units: tree.len(),
            deleted_elements,
        })
    }

    /// The unit followed by all of its descendants, breadth first.
    async fn collect_tree(&self, root: Unit) -> Result<Vec<Unit>, VeoError> {
        let client_id = root.client_id();
        let mut tree = vec![root];
        let mut next = 0;
        while next < tree.len() {
            let parent = tree[next].id();
            let children = self.units.find_by_client(&client_id, Some(&parent)).await?;
            tree.extend(children);
            next += 1;
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::{FailingPublisher, World};
    use crate::domain::element::{CustomLink, DomainAssociation};
    use crate::domain::foundation::ElementType;

    fn handler(world: &World) -> DeleteUnitHandler {
        DeleteUnitHandler::new(world.units.clone(), world.elements.clone(), world.bus.clone())
    }

    async fn child_of(world: &World, parent: UnitId) -> Unit {
        let mut child = Unit::new(UnitId::new(), world.client_id, "Child").unwrap();
        child.set_parent(Some(parent)).unwrap();
        world.units.save(&child).await.unwrap();
        child
    }

    #[tokio::test]
    async fn deletes_sub_units_and_elements() {
        let world = World::new().await;
        let child = child_of(&world, world.unit.id()).await;
        let grandchild = child_of(&world, child.id()).await;
        world.add_element(ElementType::Person, "PER_Employee").await;
        world.add_element(ElementType::Document, "DOC_Contract").await;

        let result = handler(&world)
            .handle(DeleteUnitCommand { unit_id: world.unit.id() }, world.metadata())
            .await
            .unwrap();

        assert_eq!(result, DeleteUnitResult { deleted_units: 3, deleted_elements: 2 });
        assert!(world.units.find_by_id(&grandchild.id()).await.unwrap().is_none());
        assert_eq!(world.elements.len().await, 0);
        let types = world.event_types();
        assert_eq!(types.iter().filter(|t| *t == "unit.deleted.v1").count(), 3);
        assert_eq!(types.iter().filter(|t| *t == "element.deleted.v1").count(), 2);
    }

    #[tokio::test]
    async fn links_from_other_units_are_cleaned_up() {
        let world = World::new().await;
        let other = Unit::new(UnitId::new(), world.client_id, "Other").unwrap();
        world.units.save(&other).await.unwrap();
        let person = world.add_element(ElementType::Person, "PER_Employee").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset.set_owner(other.id());
        asset.associate_with_domain(
            world.domain.id(),
            DomainAssociation::new("AST_IT", "NEW").with_link("asset_owner", CustomLink::new(person.id())),
        );
        world.store(&mut asset).await;

        handler(&world)
            .handle(DeleteUnitCommand { unit_id: world.unit.id() }, world.metadata())
            .await
            .unwrap();

        assert!(world.reload(&asset).await.link_targets().is_empty());
    }

    #[tokio::test]
    async fn restricted_user_needs_delete_role() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(
                DeleteUnitCommand { unit_id: world.unit.id() },
                world.restricted(&[], &[], &[world.unit.id()]),
            )
            .await;

        assert_eq!(result.unwrap_err(), VeoError::not_allowed("Missing unit:delete permission."));
        assert!(world.units.find_by_id(&world.unit.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn publisher_failure_is_reported() {
        let world = World::new().await;
        let handler = DeleteUnitHandler::new(
            world.units.clone(),
            world.elements.clone(),
            Arc::new(FailingPublisher),
        );

        let result = handler
            .handle(DeleteUnitCommand { unit_id: world.unit.id() }, world.metadata())
            .await;

        assert!(matches!(result, Err(VeoError::Infrastructure(_))));
    }
}
