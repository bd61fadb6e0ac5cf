//! CreateUnitHandler - creates a unit (and the client on first use).

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::{publish, ETagSalt};
use crate::domain::client::Client;
use crate::domain::foundation::{
    ClientId, CommandMetadata, DomainId, EventId, SerializableDomainEvent, Timestamp, UnitId,
    VeoError,
};
use crate::domain::unit::{Unit, UnitCreated};
use crate::ports::{ClientRepository, DomainRepository, EventPublisher, UnitRepository};

use super::check_unit_domains;

#[derive(Debug, Clone, Default)]
pub struct CreateUnitCommand {
    pub name: String,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<UnitId>,
    pub domains: BTreeSet<DomainId>,
}

#[derive(Debug, Clone)]
pub struct CreateUnitResult {
    pub unit: Unit,
    pub etag: String,
}

pub struct CreateUnitHandler {
    clients: Arc<dyn ClientRepository>,
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    salt: ETagSalt,
}

impl CreateUnitHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        salt: ETagSalt,
    ) -> Self {
        Self {
            clients,
            units,
            domains,
            event_publisher,
            salt,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateUnitCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateUnitResult, VeoError> {
        let rights = metadata.rights();
        rights.check_unit_create_allowed()?;
        let client_id = rights.require_client_id()?;

        let client = self.client_for(client_id, &cmd.name).await?;
        let existing = self.units.count_by_client(&client_id).await?;
        if !client.can_create_unit(existing) {
            return Err(VeoError::unprocessable(format!(
                "Unit limit of {} reached for client.",
                client.max_units().unwrap_or_default()
            )));
        }

        if let Some(parent_id) = cmd.parent_id {
            let parent = self.units.find_by_id(&parent_id).await?;
            if !parent.is_some_and(|p| p.client_id() == client_id) {
                return Err(VeoError::not_found("Parent unit", parent_id));
            }
        }
        check_unit_domains(self.domains.as_ref(), &client_id, &cmd.domains).await?;

        let mut unit = Unit::new(UnitId::new(), client_id, cmd.name)?;
        unit.set_abbreviation(cmd.abbreviation);
        unit.set_description(cmd.description);
        unit.set_parent(cmd.parent_id)?;
        unit.set_domains(cmd.domains);
        self.units.save(&unit).await?;

        info!(unit_id = %unit.id(), client_id = %client_id, "Unit created");

        let event = UnitCreated {
            event_id: EventId::new(),
            unit_id: unit.id(),
            client_id,
            name: unit.name().to_string(),
            parent_id: unit.parent_id(),
            created_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        let etag = self.salt.etag(&unit.id(), unit.version());
        Ok(CreateUnitResult { unit, etag })
    }

    /// Loads the caller's client, creating an activated one named after
    /// the first unit when it does not exist yet.
    async fn client_for(&self, client_id: ClientId, unit_name: &str) -> Result<Client, VeoError> {
        if let Some(client) = self.clients.find_by_id(&client_id).await? {
            return Ok(client);
        }
        let mut client = Client::new(client_id, unit_name)?;
        client.activate()?;
        self.clients.save(&client).await?;
        info!(client_id = %client_id, "Client created on first unit");
        Ok(client)
    }
}
