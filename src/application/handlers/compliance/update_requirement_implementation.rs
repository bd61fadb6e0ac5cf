//! UpdateRequirementImplementationHandler - records how a requirement is
//! implemented by an element.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::application::handlers::element::{check_responsible, load_accessible, Access};
use crate::application::handlers::support::{publish, ETagSalt};
use crate::domain::element::{
    ElementUpdated, ImplementationStatus, Origination, RequirementImplementation,
};
use crate::domain::foundation::{
    CommandMetadata, ElementId, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{ElementRepository, EventPublisher, UnitRepository};

use super::GetRequirementImplementationResult;

#[derive(Debug, Clone)]
pub struct UpdateRequirementImplementationCommand {
    pub origin_id: ElementId,
    pub control_id: ElementId,
    pub if_match: String,
    pub status: ImplementationStatus,
    pub implementation_statement: Option<String>,
    pub origination: Origination,
    pub responsible: Option<ElementId>,
}

pub struct UpdateRequirementImplementationHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    salt: ETagSalt,
}

impl UpdateRequirementImplementationHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        elements: Arc<dyn ElementRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        salt: ETagSalt,
    ) -> Self {
        Self {
            units,
            elements,
            event_publisher,
            salt,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateRequirementImplementationCommand,
        metadata: CommandMetadata,
    ) -> Result<GetRequirementImplementationResult, VeoError> {
        let (mut origin, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            metadata.rights(),
            &cmd.origin_id,
            Access::Write,
        )
        .await?;

        if let Some(responsible) = cmd.responsible {
            let wanted: BTreeSet<ElementId> = [responsible].into_iter().collect();
            let person = self.elements.find_by_ids(&wanted).await?.into_iter().next();
            check_responsible(person.as_ref(), responsible, &origin)?;
        }

        let ri = origin
            .requirement_implementation_mut(&cmd.control_id)
            .ok_or_else(|| VeoError::not_found("Requirement implementation", cmd.control_id))?;
        self.salt.check(&cmd.if_match, &ri.id, ri.version)?;
        ri.status = cmd.status;
        ri.implementation_statement = cmd.implementation_statement.filter(|s| !s.trim().is_empty());
        ri.origination = cmd.origination;
        ri.responsible = cmd.responsible;
        ri.version += 1;
        let updated: RequirementImplementation = ri.clone();

        origin.touch(metadata.user_id());
        self.elements.update(&origin).await?;
        info!(
            element_id = %origin.id(),
            control_id = %cmd.control_id,
            status = ?updated.status,
            "Requirement implementation updated"
        );

        let event = ElementUpdated {
            event_id: EventId::new(),
            element_id: origin.id(),
            element_type: origin.element_type(),
            client_id: origin.client_id(),
            version: origin.version(),
            updated_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        let etag = self.salt.etag(&updated.id, updated.version);
        Ok(GetRequirementImplementationResult {
            requirement_implementation: updated,
            etag,
        })
    }
}
