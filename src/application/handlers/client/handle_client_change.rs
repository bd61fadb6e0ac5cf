//! HandleClientChangeHandler - applies lifecycle messages of the
//! subscription service to a client.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::handlers::support::publish;
use crate::domain::client::{Client, ClientChangeType, ClientStateChanged};
use crate::domain::foundation::{
    ClientId, CommandMetadata, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{Repositories, TransactionManager};

use super::DeleteClientHandler;

/// Body of a `client_change` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChangeCommand {
    pub client_id: ClientId,
    #[serde(rename = "type")]
    pub change: ClientChangeType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub max_units: Option<u32>,
    /// Domain template names per product, as booked by the client.
    #[serde(default)]
    pub domain_products: BTreeMap<String, Vec<String>>,
}

/// Applies each message in its own unit of work, so a deletion either
/// removes all of the client's data or none of it.
pub struct HandleClientChangeHandler {
    transactions: Arc<dyn TransactionManager>,
}

impl HandleClientChangeHandler {
    pub fn new(transactions: Arc<dyn TransactionManager>) -> Self {
        Self { transactions }
    }

    /// # Errors
    ///
    /// - `NotFound` if the client is unknown (except for `Creation`)
    /// - `IllegalStateTransition` if the change is not allowed in the
    ///   client's current state
    pub async fn handle(&self, cmd: ClientChangeCommand) -> Result<(), VeoError> {
        let uow = self.transactions.begin().await?;
        apply(uow.repositories(), cmd).await?;
        uow.commit().await?;
        Ok(())
    }
}

async fn apply(repos: &Repositories, cmd: ClientChangeCommand) -> Result<(), VeoError> {
    let metadata = CommandMetadata::system(cmd.client_id).with_source("client-change");
    info!(client_id = %cmd.client_id, change = ?cmd.change, "Client change received");
    if !cmd.domain_products.is_empty() {
        debug!(client_id = %cmd.client_id, products = ?cmd.domain_products, "Booked domain products");
    }

    if cmd.change == ClientChangeType::Creation {
        return create(repos, cmd, &metadata).await;
    }

    let mut client = repos
        .clients
        .find_by_id(&cmd.client_id)
        .await?
        .ok_or_else(|| VeoError::not_found("Client", cmd.client_id))?;
    client.apply_change(cmd.change)?;

    match cmd.change {
        ClientChangeType::Deletion => {
            client.touch();
            repos.clients.update(&client).await?;
            DeleteClientHandler::new(
                repos.clients.clone(),
                repos.units.clone(),
                repos.domains.clone(),
                repos.elements.clone(),
                repos.event_publisher.clone(),
            )
            .purge(client.id(), &metadata)
            .await
        }
        ClientChangeType::Modification => {
            if let Some(max_units) = cmd.max_units {
                info!(client_id = %client.id(), max_units, "Modify max units");
                client.set_max_units(Some(max_units));
            }
            if let Some(name) = cmd.name {
                client.rename(name)?;
            }
            client.touch();
            repos.clients.update(&client).await?;
            Ok(())
        }
        _ => {
            client.touch();
            repos.clients.update(&client).await?;
            info!(client_id = %client.id(), state = client.state().as_str(), "Client state changed");
            state_changed(repos, &client, &metadata).await
        }
    }
}

async fn create(
    repos: &Repositories,
    cmd: ClientChangeCommand,
    metadata: &CommandMetadata,
) -> Result<(), VeoError> {
    if repos.clients.exists(&cmd.client_id).await? {
        warn!(client_id = %cmd.client_id, "Client already exists, creation ignored");
        return Ok(());
    }
    let name = cmd.name.unwrap_or_else(|| cmd.client_id.to_string());
    let client = Client::new(cmd.client_id, name)?.with_max_units(cmd.max_units);
    repos.clients.save(&client).await?;
    info!(client_id = %client.id(), "Client created");
    state_changed(repos, &client, metadata).await
}

async fn state_changed(
    repos: &Repositories,
    client: &Client,
    metadata: &CommandMetadata,
) -> Result<(), VeoError> {
    let event = ClientStateChanged {
        event_id: EventId::new(),
        client_id: client.id(),
        state: client.state(),
        changed_at: Timestamp::now(),
    };
    publish(repos.event_publisher.as_ref(), metadata, vec![event.to_envelope()]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::client::ClientState;
    use crate::ports::UnitRepository;
    use crate::ports::ClientRepository;
    use serde_json::json;

    fn handler(world: &World) -> HandleClientChangeHandler {
        HandleClientChangeHandler::new(world.transactions())
    }

    fn change(client_id: ClientId, change: ClientChangeType) -> ClientChangeCommand {
        ClientChangeCommand {
            client_id,
            change,
            name: None,
            max_units: None,
            domain_products: BTreeMap::new(),
        }
    }

    async fn state(world: &World, id: ClientId) -> ClientState {
        world.clients.find_by_id(&id).await.unwrap().unwrap().state()
    }

    #[test]
    fn parses_message_body() {
        let cmd: ClientChangeCommand = serde_json::from_value(json!({
            "clientId": "21712604-ed85-4f08-aa46-1cf39607ee9e",
            "type": "MODIFICATION",
            "maxUnits": 5,
            "domainProducts": {"DS-GVO": ["Beispielorganisation"]}
        }))
        .unwrap();

        assert_eq!(cmd.change, ClientChangeType::Modification);
        assert_eq!(cmd.max_units, Some(5));
        assert_eq!(cmd.domain_products["DS-GVO"], vec!["Beispielorganisation"]);
    }

    #[tokio::test]
    async fn creation_creates_client_in_created_state() {
        let world = World::new().await;
        let id = ClientId::new();
        let mut cmd = change(id, ClientChangeType::Creation);
        cmd.name = Some("New customer".into());
        cmd.max_units = Some(3);

        handler(&world).handle(cmd).await.unwrap();

        let client = world.clients.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(client.state(), ClientState::Created);
        assert_eq!(client.name(), "New customer");
        assert_eq!(client.max_units(), Some(3));
        assert_eq!(world.event_types(), vec!["client.state_changed.v1"]);
    }

    #[tokio::test]
    async fn repeated_creation_is_ignored() {
        let world = World::new().await;

        handler(&world)
            .handle(change(world.client_id, ClientChangeType::Creation))
            .await
            .unwrap();

        assert_eq!(state(&world, world.client_id).await, ClientState::Activated);
        assert!(world.event_types().is_empty());
    }

    #[tokio::test]
    async fn deactivation_and_activation_follow_lifecycle() {
        let world = World::new().await;
        let h = handler(&world);

        h.handle(change(world.client_id, ClientChangeType::Deactivation)).await.unwrap();
        assert_eq!(state(&world, world.client_id).await, ClientState::Deactivated);

        h.handle(change(world.client_id, ClientChangeType::Activation)).await.unwrap();
        assert_eq!(state(&world, world.client_id).await, ClientState::Activated);
    }

    #[tokio::test]
    async fn deletion_of_active_client_is_illegal() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(change(world.client_id, ClientChangeType::Deletion))
            .await;

        assert!(matches!(result, Err(VeoError::IllegalStateTransition(_))));
        assert!(world.clients.exists(&world.client_id).await.unwrap());
    }

    #[tokio::test]
    async fn deletion_of_deactivated_client_removes_data() {
        let world = World::new().await;
        let h = handler(&world);
        h.handle(change(world.client_id, ClientChangeType::Deactivation)).await.unwrap();

        h.handle(change(world.client_id, ClientChangeType::Deletion)).await.unwrap();

        assert!(!world.clients.exists(&world.client_id).await.unwrap());
        assert_eq!(world.units.count_by_client(&world.client_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn modification_updates_max_units() {
        let world = World::new().await;
        let mut cmd = change(world.client_id, ClientChangeType::Modification);
        cmd.max_units = Some(10);

        handler(&world).handle(cmd).await.unwrap();

        let client = world.clients.find_by_id(&world.client_id).await.unwrap().unwrap();
        assert_eq!(client.max_units(), Some(10));
    }

    #[tokio::test]
    async fn each_message_commits_once_and_failures_not_at_all() {
        let world = World::new().await;
        let transactions = world.transactions();
        let h = HandleClientChangeHandler::new(transactions.clone());

        h.handle(change(world.client_id, ClientChangeType::Deactivation)).await.unwrap();
        assert_eq!(transactions.commits(), 1);

        let result = h.handle(change(world.client_id, ClientChangeType::Creation)).await;
        assert!(result.is_ok());
        assert_eq!(transactions.commits(), 2);

        let result = h.handle(change(ClientId::new(), ClientChangeType::Deletion)).await;
        assert!(result.is_err());
        assert_eq!(transactions.commits(), 2);
    }

    #[tokio::test]
    async fn unknown_client_is_not_found() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(change(ClientId::new(), ClientChangeType::Activation))
            .await;

        assert!(matches!(result, Err(VeoError::NotFound { entity: "Client", .. })));
    }
}
