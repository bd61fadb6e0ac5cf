//! Deleting an element together with every reference to it.

use std::sync::Arc;

use tracing::debug;

use crate::domain::element::{
    Element, ElementDeleted, RiskAffectedLinkDeleted, RiskAffectingElementChanged, RiskChange,
};
use crate::domain::foundation::{
    CommandMetadata, EventEnvelope, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::ElementRepository;

/// Removes elements and cleans up the elements pointing at them.
///
/// Shared by element deletion and unit deletion. Access checks are the
/// caller's job.
pub struct ElementRemover {
    elements: Arc<dyn ElementRepository>,
}

impl ElementRemover {
    pub fn new(elements: Arc<dyn ElementRepository>) -> Self {
        Self { elements }
    }

    /// Deletes `element` and returns the events to publish.
    ///
    /// Referencing elements lose their links, parts, members, risks and
    /// implementations of it, and it is unset wherever it is responsible.
    pub async fn remove(
        &self,
        element: &Element,
        metadata: &CommandMetadata,
    ) -> Result<Vec<EventEnvelope>, VeoError> {
        let id = element.id();
        let now = Timestamp::now();
        let mut events = Vec::new();

        for mut referencing in self.elements.find_referencing(&id).await? {
            let mut changed = referencing.remove_child(id);
            changed |= referencing.remove_links_to(id);
            changed |= referencing.remove_risks_for(id);
            changed |= referencing.remove_control_implementation(&id);
            changed |= referencing.remove_requirement(&id);
            changed |= referencing.clear_responsible(&id);
            if changed {
                referencing.touch(metadata.user_id());
                self.elements.update(&referencing).await?;
                debug!(element_id = %referencing.id(), removed = %id, "Removed references");
            }
        }

        if element.element_type().affects_risk() {
            events.push(
                RiskAffectingElementChanged {
                    event_id: EventId::new(),
                    element_id: id,
                    element_type: element.element_type(),
                    client_id: element.client_id(),
                    change: RiskChange::ElementDeleted,
                    changed_at: now,
                }
                .to_envelope(),
            );
        }
        if element.element_type().is_risk_affected() {
            for target in element.link_targets() {
                events.push(
                    RiskAffectedLinkDeleted {
                        event_id: EventId::new(),
                        target_id: target,
                        source_id: id,
                        source_type: element.element_type(),
                        client_id: element.client_id(),
                        deleted_at: now,
                    }
                    .to_envelope(),
                );
            }
        }

        self.elements.delete(&id).await?;
        events.push(
            ElementDeleted {
                event_id: EventId::new(),
                element_id: id,
                element_type: element.element_type(),
                owner: element.owner(),
                client_id: element.client_id(),
                deleted_at: now,
            }
            .to_envelope(),
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::element::{CustomLink, DomainAssociation, ElementRisk, NoElements};
    use crate::domain::foundation::ElementType;

    #[tokio::test]
    async fn removes_links_parts_and_risks_pointing_at_element() {
        let world = World::new().await;
        let owner = world.add_element(ElementType::Person, "PER_Employee").await;
        let scenario = world.add_element(ElementType::Scenario, "SCN_Scenario").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset.associate_with_domain(
            world.domain.id(),
            DomainAssociation::new("AST_IT", "NEW").with_link("asset_owner", CustomLink::new(owner.id())),
        );
        asset
            .set_risks(vec![ElementRisk::new(scenario.id(), world.domain.id(), "DSRA")])
            .unwrap();
        world.store(&mut asset).await;
        let remover = ElementRemover::new(world.elements.clone());

        remover.remove(&owner, &world.metadata()).await.unwrap();
        remover.remove(&scenario, &world.metadata()).await.unwrap();

        let asset = world.reload(&asset).await;
        assert!(asset.link_targets().is_empty());
        assert!(asset.risks().is_empty());
        assert!(world.elements.find_by_id(&owner.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn risk_affected_element_notifies_link_targets() {
        let world = World::new().await;
        let owner = world.add_element(ElementType::Person, "PER_Employee").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset.associate_with_domain(
            world.domain.id(),
            DomainAssociation::new("AST_IT", "NEW").with_link("asset_owner", CustomLink::new(owner.id())),
        );
        world.store(&mut asset).await;

        let events = ElementRemover::new(world.elements.clone())
            .remove(&asset, &world.metadata())
            .await
            .unwrap();

        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "risk_affecting_element.changed.v1",
                "risk_affected.link_deleted.v1",
                "element.deleted.v1"
            ]
        );
        assert_eq!(events[1].aggregate_id, owner.id().to_string());
    }

    #[tokio::test]
    async fn removed_person_is_no_longer_responsible() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;
        let control = world.add_element(ElementType::Control, "CTL_TOM").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset.implement_control(&control, &NoElements).unwrap();
        asset.control_implementation_mut(&control.id()).unwrap().responsible = Some(person.id());
        asset.requirement_implementation_mut(&control.id()).unwrap().responsible = Some(person.id());
        world.store(&mut asset).await;

        ElementRemover::new(world.elements.clone())
            .remove(&person, &world.metadata())
            .await
            .unwrap();

        let asset = world.reload(&asset).await;
        assert!(asset.control_implementations()[0].responsible.is_none());
        assert!(asset.requirement_implementation(&control.id()).unwrap().responsible.is_none());
        assert!(!asset.referenced_elements().contains(&person.id()));
        assert!(super::super::ElementContext::load(
            world.domains.as_ref(),
            world.elements.as_ref(),
            &world.client_id,
            &asset
        )
        .await
        .is_ok());
        assert!(world
            .elements
            .find_referencing(&person.id())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn person_deletion_only_emits_deleted_event() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;

        let events = ElementRemover::new(world.elements.clone())
            .remove(&person, &world.metadata())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "element.deleted.v1");
    }
}
