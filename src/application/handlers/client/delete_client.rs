//! DeleteClientHandler - removes a client with all of its data.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::{publish, require_admin};
use crate::application::handlers::unit::{DeleteUnitCommand, DeleteUnitHandler};
use crate::domain::client::ClientDeleted;
use crate::domain::foundation::{
    ClientId, CommandMetadata, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{
    ClientRepository, DomainRepository, ElementRepository, EventPublisher, UnitRepository,
};

#[derive(Debug, Clone)]
pub struct DeleteClientCommand {
    pub client_id: ClientId,
}

pub struct DeleteClientHandler {
    clients: Arc<dyn ClientRepository>,
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    delete_unit: DeleteUnitHandler,
    event_publisher: Arc<dyn EventPublisher>,
}

impl DeleteClientHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        elements: Arc<dyn ElementRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let delete_unit = DeleteUnitHandler::new(units.clone(), elements, event_publisher.clone());
        Self {
            clients,
            units,
            domains,
            delete_unit,
            event_publisher,
        }
    }

    /// Admin entry point.
    pub async fn handle(&self, cmd: DeleteClientCommand, metadata: CommandMetadata) -> Result<(), VeoError> {
        require_admin(&metadata)?;
        if !self.clients.exists(&cmd.client_id).await? {
            return Err(VeoError::not_found("Client", cmd.client_id));
        }
        self.purge(cmd.client_id, &metadata).await
    }

    /// Deletes every unit (with its elements) and every domain of the
    /// client, then the client itself. Unit deletion runs with
    /// unrestricted rights inside the client.
    pub(crate) async fn purge(&self, client_id: ClientId, metadata: &CommandMetadata) -> Result<(), VeoError> {
        let system = CommandMetadata::system(client_id)
            .with_correlation_id(metadata.correlation_id())
            .with_source("client-deletion");

        let mut deleted_units = 0;
        // Deleting a unit also deletes its descendants, so re-read after
        // each deletion.
        while let Some(unit) = self.units.find_by_client(&client_id, None).await?.into_iter().next() {
            let result = self
                .delete_unit
                .handle(DeleteUnitCommand { unit_id: unit.id() }, system.clone())
                .await?;
            deleted_units += result.deleted_units;
        }

        for domain in self.domains.find_by_client(&client_id).await? {
            self.domains.delete(&domain.id()).await?;
        }
        self.clients.delete(&client_id).await?;

        info!(client_id = %client_id, deleted_units, "Client deleted");

        let event = ClientDeleted {
            event_id: EventId::new(),
            client_id,
            deleted_units,
            deleted_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), metadata, vec![event.to_envelope()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::foundation::{ElementType, UnitId};
    use crate::domain::unit::Unit;

    fn handler(world: &World) -> DeleteClientHandler {
        DeleteClientHandler::new(
            world.clients.clone(),
            world.units.clone(),
            world.domains.clone(),
            world.elements.clone(),
            world.bus.clone(),
        )
    }

    #[tokio::test]
    async fn admin_deletes_everything_of_client() {
        let world = World::new().await;
        let mut child = Unit::new(UnitId::new(), world.client_id, "Child").unwrap();
        child.set_parent(Some(world.unit.id())).unwrap();
        world.units.save(&child).await.unwrap();
        world.add_element(ElementType::Person, "PER_Employee").await;

        handler(&world)
            .handle(DeleteClientCommand { client_id: world.client_id }, world.admin())
            .await
            .unwrap();

        assert!(!world.clients.exists(&world.client_id).await.unwrap());
        assert_eq!(world.units.count_by_client(&world.client_id).await.unwrap(), 0);
        assert!(world.domains.find_by_client(&world.client_id).await.unwrap().is_empty());
        assert_eq!(world.elements.len().await, 0);
        assert_eq!(world.event_types().last().map(String::as_str), Some("client.deleted.v1"));
    }

    #[tokio::test]
    async fn non_admin_is_rejected() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(DeleteClientCommand { client_id: world.client_id }, world.metadata())
            .await;

        assert_eq!(result.unwrap_err(), VeoError::MissingAdminPrivileges);
        assert!(world.clients.exists(&world.client_id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_client_is_not_found() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(DeleteClientCommand { client_id: ClientId::new() }, world.admin())
            .await;

        assert!(matches!(result, Err(VeoError::NotFound { entity: "Client", .. })));
    }

    #[tokio::test]
    async fn other_clients_are_untouched() {
        let world = World::new().await;
        let other = World::new().await;

        handler(&world)
            .handle(DeleteClientCommand { client_id: world.client_id }, world.admin())
            .await
            .unwrap();

        assert_eq!(other.units.count_by_client(&other.client_id).await.unwrap(), 1);
    }
}
