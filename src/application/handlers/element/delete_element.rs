//! DeleteElementHandler - deletes one element after a write check.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::publish;
use crate::domain::foundation::{CommandMetadata, ElementId, VeoError};
use crate::ports::{ElementRepository, EventPublisher, UnitRepository};

use super::{load_accessible, Access, ElementRemover};

#[derive(Debug, Clone)]
pub struct DeleteElementCommand {
    pub element_id: ElementId,
}

pub struct DeleteElementHandler {
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl DeleteElementHandler {
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

    pub async fn handle(&self, cmd: DeleteElementCommand, metadata: CommandMetadata) -> Result<(), VeoError> {
        let (element, _) = load_accessible(
            self.elements.as_ref(),
            self.units.as_ref(),
            metadata.rights(),
            &cmd.element_id,
            Access::Write,
        )
        .await?;

        let events = ElementRemover::new(self.elements.clone())
            .remove(&element, &metadata)
            .await?;
        info!(element_id = %element.id(), "Element deleted");

        publish(self.event_publisher.as_ref(), &metadata, events).await
    }
}
