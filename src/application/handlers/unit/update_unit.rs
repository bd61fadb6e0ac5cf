//! UpdateUnitHandler - changes name, texts, and domains of a unit.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::{load_unit, publish, ETagSalt};
use crate::domain::foundation::{
    CommandMetadata, DomainId, EventId, SerializableDomainEvent, Timestamp, UnitId, VeoError,
};
use crate::domain::unit::{Unit, UnitUpdated};
use crate::ports::{DomainRepository, EventPublisher, UnitRepository};

use super::check_unit_domains;

#[derive(Debug, Clone)]
pub struct UpdateUnitCommand {
    pub unit_id: UnitId,
    pub if_match: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
    pub domains: BTreeSet<DomainId>,
}

#[derive(Debug, Clone)]
pub struct UpdateUnitResult {
    pub unit: Unit,
    pub etag: String,
}

pub struct UpdateUnitHandler {
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    salt: ETagSalt,
}

impl UpdateUnitHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        salt: ETagSalt,
    ) -> Self {
        Self {
            units,
            domains,
            event_publisher,
            salt,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateUnitCommand,
        metadata: CommandMetadata,
    ) -> Result<UpdateUnitResult, VeoError> {
        let rights = metadata.rights();
        rights.check_unit_update_allowed()?;
        let mut unit = load_unit(self.units.as_ref(), &cmd.unit_id).await?;
        rights.check_client(&unit)?;
        self.salt.check(&cmd.if_match, &unit.id(), unit.version())?;
        check_unit_domains(self.domains.as_ref(), &unit.client_id(), &cmd.domains).await?;

        unit.rename(cmd.name)?;
        unit.set_abbreviation(cmd.abbreviation);
        unit.set_description(cmd.description);
        unit.set_domains(cmd.domains);
        unit.touch();
        self.units.update(&unit).await?;

        info!(unit_id = %unit.id(), version = unit.version(), "Unit updated");

        let event = UnitUpdated {
            event_id: EventId::new(),
            unit_id: unit.id(),
            client_id: unit.client_id(),
            version: unit.version(),
            updated_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        let etag = self.salt.etag(&unit.id(), unit.version());
        Ok(UpdateUnitResult { unit, etag })
    }
}
