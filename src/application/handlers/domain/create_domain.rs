//! CreateDomainHandler - creates a blank domain for the caller's client.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::{publish, require_content_creator};
use crate::domain::domains::{Domain, DomainCreated};
use crate::domain::foundation::{
    CommandMetadata, DomainId, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::ports::{ClientRepository, DomainRepository, EventPublisher};

/// Template version of domains that were not created from a template.
pub const BLANK_DOMAIN_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Default)]
pub struct CreateDomainCommand {
    pub name: String,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
    pub authority: String,
}

pub struct CreateDomainHandler {
    clients: Arc<dyn ClientRepository>,
    domains: Arc<dyn DomainRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateDomainHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        domains: Arc<dyn DomainRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            clients,
            domains,
            event_publisher,
        }
    }

    /// # Errors
    ///
    /// - `NotAllowed` without the content creator role
    /// - `AlreadyExists` if the client has a domain of that name
    /// - `ValidationFailed` for an empty name or authority
    pub async fn handle(
        &self,
        cmd: CreateDomainCommand,
        metadata: CommandMetadata,
    ) -> Result<Domain, VeoError> {
        require_content_creator(&metadata)?;
        let client_id = metadata.rights().require_client_id()?;

        let taken = self
            .domains
            .find_by_client(&client_id)
            .await?
            .iter()
            .any(|d| d.name() == cmd.name);
        if taken {
            return Err(VeoError::already_exists("Domain", &cmd.name));
        }

        let mut domain = Domain::new(
            DomainId::new(),
            client_id,
            cmd.name,
            cmd.authority,
            BLANK_DOMAIN_VERSION,
        )?;
        if let Some(abbreviation) = cmd.abbreviation {
            domain = domain.with_abbreviation(abbreviation);
        }
        if let Some(description) = cmd.description {
            domain = domain.with_description(description);
        }
        self.domains.save(&domain).await?;

        if let Some(mut client) = self.clients.find_by_id(&client_id).await? {
            client.add_domain(domain.id());
            client.touch();
            self.clients.update(&client).await?;
        }
        info!(domain_id = %domain.id(), client_id = %client_id, name = domain.name(), "Domain created");

        let event = DomainCreated {
            event_id: EventId::new(),
            domain_id: domain.id(),
            client_id,
            name: domain.name().to_string(),
            created_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;
        Ok(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::foundation::{UserAccessRights, UserId, CONTENT_CREATOR_ROLE};

    fn handler(world: &World) -> CreateDomainHandler {
        CreateDomainHandler::new(world.clients.clone(), world.domains.clone(), world.bus.clone())
    }

    fn named(name: &str) -> CreateDomainCommand {
        CreateDomainCommand {
            name: name.to_string(),
            abbreviation: Some("NIS2".into()),
            description: None,
            authority: "EU".into(),
        }
    }

    fn content_creator(world: &World) -> CommandMetadata {
        CommandMetadata::new(UserAccessRights::new(
            UserId::new("author").unwrap(),
            Some(world.client_id),
            vec![CONTENT_CREATOR_ROLE.to_string()],
            Default::default(),
            Default::default(),
        ))
    }

    #[tokio::test]
    async fn content_creator_creates_blank_domain() {
        let world = World::new().await;

        let domain = handler(&world)
            .handle(named("NIS-2"), content_creator(&world))
            .await
            .unwrap();

        assert!(domain.is_active());
        assert_eq!(domain.template_version(), BLANK_DOMAIN_VERSION);
        assert_eq!(domain.abbreviation(), Some("NIS2"));
        assert!(domain.element_type_definitions().is_empty());
        let stored = world.domains.find_by_id(&domain.id()).await.unwrap();
        assert_eq!(stored, Some(domain.clone()));
        let client = world.clients.find_by_id(&world.client_id).await.unwrap().unwrap();
        assert!(client.domains().contains(&domain.id()));
        assert_eq!(world.event_types(), vec!["domain.created.v1"]);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let world = World::new().await;

        let result = handler(&world).handle(named("DS-GVO"), world.admin()).await;

        assert!(matches!(result, Err(VeoError::AlreadyExists { entity: "Domain", .. })));
    }

    #[tokio::test]
    async fn plain_users_cannot_create_domains() {
        let world = World::new().await;

        let result = handler(&world).handle(named("NIS-2"), world.metadata()).await;

        assert!(matches!(result, Err(VeoError::NotAllowed(_))));
        assert!(world.event_types().is_empty());
    }
}
