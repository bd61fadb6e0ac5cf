//! CreateElementHandler - validates a payload and stores a new element.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::application::handlers::support::{load_unit, publish, ETagSalt};
use crate::domain::element::{Element, ElementCreated};
use crate::domain::foundation::{
    CommandMetadata, ElementId, ElementType, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{
    DomainRepository, ElementRepository, ElementSchemaValidator, EventPublisher, UnitRepository,
};

use super::{ControlImplementationService, ElementContext, ElementInput};

#[derive(Debug, Clone)]
pub struct CreateElementCommand {
    pub element_type: ElementType,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct CreateElementResult {
    pub element: Element,
    pub etag: String,
}

pub struct CreateElementHandler {
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    elements: Arc<dyn ElementRepository>,
    validator: Arc<dyn ElementSchemaValidator>,
    event_publisher: Arc<dyn EventPublisher>,
    salt: ETagSalt,
}

impl CreateElementHandler {
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
        cmd: CreateElementCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateElementResult, VeoError> {
        let rights = metadata.rights();
        let client_id = rights.require_client_id()?;

        // 1. Structural validation against the client's domains
        let active_domains = self.domains.find_active_by_client(&client_id).await?;
        let input = ElementInput::parse(
            self.validator.as_ref(),
            cmd.element_type,
            &active_domains,
            cmd.payload,
        )?;

        // 2. Owner unit must be writable and belong to the caller's client
        rights.check_create_element_write_access(input.owner)?;
        let unit = load_unit(self.units.as_ref(), &input.owner).await?;
        rights.check_client(&unit)?;

        // 3. Build the element
        let mut element = Element::new(
            ElementId::new(),
            cmd.element_type,
            input.owner,
            client_id,
            input.name.clone(),
            metadata.user_id(),
        )?;
        input.apply_to(&mut element)?;
        if cmd.element_type.is_risk_affected() {
            ControlImplementationService::new(self.elements.clone())
                .apply(&mut element, &input.control_implementations)
                .await?;
        }

        // 4. Domain-sensitive validation and decisions
        let context =
            ElementContext::load(self.domains.as_ref(), self.elements.as_ref(), &client_id, &element)
                .await?;
        context.validate(&element)?;
        context.decide(&mut element);

        // 5. Designator and persistence
        let number = self.elements.next_designator(&client_id, cmd.element_type).await?;
        element.assign_designator(number);
        self.elements.save(&element).await?;

        info!(
            element_id = %element.id(),
            designator = %element.designator(),
            client_id = %client_id,
            "Element created"
        );

        let event = ElementCreated {
            event_id: EventId::new(),
            element_id: element.id(),
            element_type: element.element_type(),
            owner: element.owner(),
            client_id,
            designator: element.designator().to_string(),
            created_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        let etag = self.salt.etag(&element.id(), element.version());
        Ok(CreateElementResult { element, etag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::foundation::UnitId;
    use serde_json::json;

    fn handler(world: &World) -> CreateElementHandler {
        CreateElementHandler::new(
            world.units.clone(),
            world.domains.clone(),
            world.elements.clone(),
            world.validator.clone(),
            world.bus.clone(),
            world.salt(),
        )
    }

    fn asset_payload(world: &World, number: i64) -> Value {
        json!({
            "name": "Mail server",
            "abbreviation": "MS",
            "owner": world.unit.id().to_string(),
            "domains": {
                world.domain.id().to_string(): {
                    "subType": "AST_IT",
                    "status": "NEW",
                    "customAspects": {"asset_details": {"asset_details_number": number}}
                }
            }
        })
    }

    fn create(payload: Value) -> CreateElementCommand {
        CreateElementCommand {
            element_type: ElementType::Asset,
            payload,
        }
    }

    #[tokio::test]
    async fn creates_element_with_designator_and_decisions() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(create(asset_payload(&world, 1)), world.metadata())
            .await
            .unwrap();

        let element = result.element;
        assert_eq!(element.designator(), "AST-1");
        assert_eq!(element.abbreviation(), Some("MS"));
        assert_eq!(element.created_by(), "test-user");
        let association = element.association(&world.domain.id()).unwrap();
        assert_eq!(association.decision_results["asset_critical"].value, Some(true));
        assert_eq!(result.etag, world.salt().etag(&element.id(), 0));
        assert_eq!(world.event_types(), vec!["element.created.v1"]);
    }

    #[tokio::test]
    async fn designators_increase_per_type() {
        let world = World::new().await;
        let h = handler(&world);

        h.handle(create(asset_payload(&world, 1)), world.metadata()).await.unwrap();
        let second = h
            .handle(create(asset_payload(&world, 2)), world.metadata())
            .await
            .unwrap();

        assert_eq!(second.element.designator(), "AST-2");
    }

    #[tokio::test]
    async fn rejects_undefined_sub_type_in_schema() {
        let world = World::new().await;
        let mut payload = asset_payload(&world, 1);
        payload["domains"][world.domain.id().to_string()]["subType"] = json!("AST_Unknown");

        let result = handler(&world).handle(create(payload), world.metadata()).await;

        assert!(matches!(result, Err(VeoError::ValidationFailed { .. })));
        assert_eq!(world.elements.len().await, 0);
    }

    #[tokio::test]
    async fn rejects_link_with_wrong_target_type() {
        let world = World::new().await;
        let document = world.add_element(ElementType::Document, "DOC_Contract").await;
        let mut payload = asset_payload(&world, 1);
        payload["domains"][world.domain.id().to_string()]["links"] =
            json!({"asset_owner": [{"target": document.id().to_string()}]});

        let result = handler(&world).handle(create(payload), world.metadata()).await;

        assert_eq!(
            result.unwrap_err(),
            VeoError::unprocessable("Invalid target type 'document' for link type 'asset_owner'")
        );
    }

    #[tokio::test]
    async fn restricted_user_needs_write_access_to_owner() {
        let world = World::new().await;
        let metadata = world.restricted(&[], &[world.unit.id()], &[]);

        let result = handler(&world).handle(create(asset_payload(&world, 1)), metadata).await;

        assert_eq!(
            result.unwrap_err(),
            VeoError::not_allowed(format!("Missing unit '{}' write permission.", world.unit.id()))
        );
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let world = World::new().await;
        let mut payload = asset_payload(&world, 1);
        payload["owner"] = json!(UnitId::new().to_string());

        let result = handler(&world).handle(create(payload), world.metadata()).await;

        assert!(matches!(result, Err(VeoError::NotFound { entity: "Unit", .. })));
    }

    #[tokio::test]
    async fn unit_of_other_client_violates_boundary() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(create(asset_payload(&world, 1)), world.stranger())
            .await;

        // The stranger's client has no domains, so the domain key is
        // already rejected by the schema.
        assert!(matches!(result, Err(VeoError::ValidationFailed { .. })));

        let payload = json!({"name": "x", "owner": world.unit.id().to_string()});
        let result = handler(&world).handle(create(payload), world.stranger()).await;
        assert!(matches!(result, Err(VeoError::ClientBoundaryViolation { .. })));
    }
}
