//! ListDomainsHandler - active domains of the caller's client.

use std::sync::Arc;

use crate::domain::domains::Domain;
use crate::domain::foundation::{CommandMetadata, VeoError};
use crate::ports::DomainRepository;

pub struct ListDomainsHandler {
    domains: Arc<dyn DomainRepository>,
}

impl ListDomainsHandler {
    pub fn new(domains: Arc<dyn DomainRepository>) -> Self {
        Self { domains }
    }

    pub async fn handle(&self, metadata: CommandMetadata) -> Result<Vec<Domain>, VeoError> {
        let client_id = metadata.rights().require_client_id()?;
        Ok(self.domains.find_active_by_client(&client_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::domains::fixtures::test_domain;

    #[tokio::test]
    async fn inactive_domains_are_not_listed() {
        let world = World::new().await;
        let mut retired = test_domain(world.client_id);
        retired.deactivate();
        world.domains.save(&retired).await.unwrap();

        let listed = ListDomainsHandler::new(world.domains.clone())
            .handle(world.metadata())
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), world.domain.id());
    }
}
