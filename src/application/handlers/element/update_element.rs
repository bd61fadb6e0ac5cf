//! UpdateElementHandler - replaces the writable state of an element.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::application::handlers::support::{load_unit, publish, ETagSalt};
use crate::domain::element::{Element, ElementUpdated, RiskAffectingElementChanged, RiskChange};
use crate::domain::foundation::{
    CommandMetadata, ElementId, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{
    DomainRepository, ElementRepository, ElementSchemaValidator, EventPublisher, UnitRepository,
};

use super::{load_accessible, Access, ControlImplementationService, ElementContext, ElementInput};

#[derive(Debug, Clone)]
pub struct UpdateElementCommand {
    pub element_id: ElementId,
    /// Value of the `If-Match` header.
    pub if_match: String,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct UpdateElementResult {
    pub element: Element,
    pub etag: String,
}

pub struct UpdateElementHandler {
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    elements: Arc<dyn ElementRepository>,
    validator: Arc<dyn ElementSchemaValidator>,
    event_publisher: Arc<dyn EventPublisher>,
    salt: ETagSalt,
}

impl UpdateElementHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        elements: Arc<dyn ElementRepository>,
        validator: Arc<dyn ElementSchemaValidator>,
        event_publisher: Arc<dyn EventPublisher>,
        salt: ETagSalt,
    ) -> Self {
        Self {
            units,
            domains,
            elements,
            validator,
            event_publisher,
            salt,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateElementCommand,
        metadata: CommandMetadata,
    ) -> Result<UpdateElementResult, VeoError> {
        let rights = metadata.rights();
        let (mut element, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            rights,
            &cmd.element_id,
            Access::Write,
        )
        .await?;
        self.salt.check(&cmd.if_match, &element.id(), element.version())?;

        let client_id = element.client_id();
        let active_domains = self.domains.find_active_by_client(&client_id).await?;
        let input = ElementInput::parse(
            self.validator.as_ref(),
            element.element_type(),
            &active_domains,
            cmd.payload,
        )?;

        if input.owner != element.owner() {
            rights.check_create_element_write_access(input.owner)?;
            let new_owner = load_unit(self.units.as_ref(), &input.owner).await?;
            rights.check_client(&new_owner)?;
        }

        let (added_parts, removed_parts) = input.apply_to(&mut element)?;
        let compliance = ControlImplementationService::new(self.elements.clone());
        if element.element_type().is_risk_affected() {
            compliance.apply(&mut element, &input.control_implementations).await?;
        }

        let context =
            ElementContext::load(self.domains.as_ref(), self.elements.as_ref(), &client_id, &element)
                .await?;
        context.validate(&element)?;
        context.decide(&mut element);

        element.touch(metadata.user_id());
        self.elements.update(&element).await?;

        let implementers = compliance
            .parts_changed(&element, &added_parts, &removed_parts, metadata.user_id())
            .await?;

        info!(
            element_id = %element.id(),
            version = element.version(),
            propagated = implementers.len(),
            "Element updated"
        );

        let now = Timestamp::now();
        let mut events = vec![ElementUpdated {
            event_id: EventId::new(),
            element_id: element.id(),
            element_type: element.element_type(),
            client_id,
            version: element.version(),
            updated_at: now,
        }
        .to_envelope()];
        if element.element_type().affects_risk() {
            events.push(
                RiskAffectingElementChanged {
                    event_id: EventId::new(),
                    element_id: element.id(),
                    element_type: element.element_type(),
                    client_id,
                    change: RiskChange::ElementModified,
                    changed_at: now,
                }
                .to_envelope(),
            );
        }
        for implementer in &implementers {
            events.push(
                ElementUpdated {
                    event_id: EventId::new(),
                    element_id: implementer.id(),
                    element_type: implementer.element_type(),
                    client_id,
                    version: implementer.version(),
                    updated_at: now,
                }
                .to_envelope(),
            );
        }
        publish(self.event_publisher.as_ref(), &metadata, events).await?;

        let etag = self.salt.etag(&element.id(), element.version());
        Ok(UpdateElementResult { element, etag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::foundation::{ElementType, UnitId};
    use crate::domain::unit::Unit;
    use serde_json::json;
    use std::collections::HashMap;

    fn handler(world: &World) -> UpdateElementHandler {
        UpdateElementHandler::new(
            world.units.clone(),
            world.domains.clone(),
            world.elements.clone(),
            world.validator.clone(),
            world.bus.clone(),
            world.salt(),
        )
    }

    fn update(world: &World, element: &Element, payload: Value) -> UpdateElementCommand {
        UpdateElementCommand {
            element_id: element.id(),
            if_match: world.salt().etag(&element.id(), element.version()),
            payload,
        }
    }

    fn person_payload(world: &World, name: &str) -> Value {
        json!({
            "name": name,
            "owner": world.unit.id().to_string(),
            "domains": {
                world.domain.id().to_string(): {"subType": "PER_Employee", "status": "IN_PROGRESS"}
            }
        })
    }

    #[tokio::test]
    async fn updates_and_bumps_version() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;

        let result = handler(&world)
            .handle(update(&world, &person, person_payload(&world, "Alice")), world.metadata())
            .await
            .unwrap();

        assert_eq!(result.element.name(), "Alice");
        assert_eq!(result.element.version(), person.version() + 1);
        assert_eq!(result.element.status(&world.domain.id()), Some("IN_PROGRESS"));
        assert_eq!(result.etag, world.salt().etag(&person.id(), person.version() + 1));
        assert_eq!(world.reload(&person).await.name(), "Alice");
        assert_eq!(world.event_types(), vec!["element.updated.v1"]);
    }

    #[tokio::test]
    async fn stale_etag_is_rejected() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;
        let mut cmd = update(&world, &person, person_payload(&world, "Alice"));
        cmd.if_match = world.salt().etag(&person.id(), person.version() + 7);

        let result = handler(&world).handle(cmd, world.metadata()).await;

        assert_eq!(result.unwrap_err(), VeoError::ETagMismatch { id: person.id().to_string() });
        assert_eq!(world.reload(&person).await.version(), person.version());
    }

    #[tokio::test]
    async fn moving_to_unwritable_unit_is_rejected() {
        let world = World::new().await;
        let person = world.add_element(ElementType::Person, "PER_Employee").await;
        let target = Unit::new(UnitId::new(), world.client_id, "Archive").unwrap();
        world.units.save(&target).await.unwrap();
        let mut payload = person_payload(&world, "Alice");
        payload["owner"] = json!(target.id().to_string());

        let result = handler(&world)
            .handle(
                update(&world, &person, payload),
                world.restricted(&[], &[], &[world.unit.id()]),
            )
            .await;

        assert!(matches!(result, Err(VeoError::NotAllowed(_))));
    }

    #[tokio::test]
    async fn asset_update_announces_risk_change() {
        let world = World::new().await;
        let asset = world.add_element(ElementType::Asset, "AST_IT").await;
        let payload = json!({
            "name": "Server",
            "owner": world.unit.id().to_string(),
            "domains": {
                world.domain.id().to_string(): {"subType": "AST_IT", "status": "NEW"}
            }
        });

        handler(&world)
            .handle(update(&world, &asset, payload), world.metadata())
            .await
            .unwrap();

        assert_eq!(
            world.event_types(),
            vec!["element.updated.v1", "risk_affecting_element.changed.v1"]
        );
    }

    #[tokio::test]
    async fn new_control_part_reaches_implementers() {
        let world = World::new().await;
        let control = world.add_element(ElementType::Control, "CTL_Requirement").await;
        let part = world.add_element(ElementType::Control, "CTL_Requirement").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset
            .implement_control(&control, &HashMap::<ElementId, Element>::new())
            .unwrap();
        world.store(&mut asset).await;

        let payload = json!({
            "name": control.name(),
            "owner": world.unit.id().to_string(),
            "parts": [part.id().to_string()],
            "domains": {
                world.domain.id().to_string(): {"subType": "CTL_Requirement", "status": "NEW"}
            }
        });
        handler(&world)
            .handle(update(&world, &control, payload), world.metadata())
            .await
            .unwrap();

        let asset = world.reload(&asset).await;
        assert!(asset.requirement_implementation(&part.id()).is_some());
        assert_eq!(asset.version(), 2);
        assert_eq!(
            world.event_types(),
            vec!["element.updated.v1", "risk_affecting_element.changed.v1", "element.updated.v1"]
        );
    }
}
