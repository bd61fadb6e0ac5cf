//! In-memory TransactionManager.
//!
//! Writes go straight to the shared repositories, so there is nothing to
//! roll back: a unit of work that is dropped keeps what it wrote.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{Repositories, TransactionManager, UnitOfWork};

pub struct InMemoryTransactionManager {
    repositories: Repositories,
}

impl InMemoryTransactionManager {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }
}

struct InMemoryUnitOfWork {
    repositories: Repositories,
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        Ok(Box::new(InMemoryUnitOfWork {
            repositories: self.repositories.clone(),
        }))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{
        InMemoryClientRepository, InMemoryDomainRepository, InMemoryElementRepository,
        InMemoryUnitRepository,
    };
    use crate::adapters::InMemoryEventBus;
    use crate::domain::client::Client;
    use crate::domain::foundation::ClientId;
    use crate::ports::ClientRepository;

    #[tokio::test]
    async fn unit_of_work_shares_the_repositories() {
        let clients = Arc::new(InMemoryClientRepository::new());
        let manager = InMemoryTransactionManager::new(Repositories {
            clients: clients.clone(),
            units: Arc::new(InMemoryUnitRepository::new()),
            domains: Arc::new(InMemoryDomainRepository::new()),
            elements: Arc::new(InMemoryElementRepository::new()),
            event_publisher: Arc::new(InMemoryEventBus::new()),
        });
        let client = Client::new(ClientId::new(), "Acme").unwrap();

        let uow = manager.begin().await.unwrap();
        uow.repositories().clients.save(&client).await.unwrap();
        uow.commit().await.unwrap();

        assert!(clients.exists(&client.id()).await.unwrap());
    }
}
