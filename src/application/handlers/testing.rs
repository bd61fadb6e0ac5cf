//! In-memory wiring for handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::memory::{
    InMemoryClientRepository, InMemoryDomainRepository, InMemoryElementRepository,
    InMemoryUnitRepository,
};
use crate::adapters::validation::JsonSchemaValidator;
use crate::adapters::InMemoryEventBus;
use crate::domain::client::Client;
use crate::domain::domains::fixtures::test_domain;
use crate::domain::domains::Domain;
use crate::domain::element::aggregate::fixtures::element;
use crate::domain::element::{DomainAssociation, Element};
use crate::domain::foundation::{
    ClientId, CommandMetadata, DomainError, ElementType, ErrorCode, EventEnvelope, UnitId,
    UserAccessRights, UserId,
};
use crate::domain::unit::Unit;
use crate::ports::{
    ClientRepository, DomainRepository, ElementRepository, EventPublisher, Repositories,
    TransactionManager, UnitOfWork, UnitRepository,
};

use super::ETagSalt;

pub const SALT: &str = "test-salt";

/// One client with a unit and the standard test domain.
pub struct World {
    pub clients: Arc<InMemoryClientRepository>,
    pub units: Arc<InMemoryUnitRepository>,
    pub domains: Arc<InMemoryDomainRepository>,
    pub elements: Arc<InMemoryElementRepository>,
    pub bus: Arc<InMemoryEventBus>,
    pub validator: Arc<JsonSchemaValidator>,
    pub client_id: ClientId,
    pub unit: Unit,
    pub domain: Domain,
}

impl World {
    pub async fn new() -> Self {
        let client_id = ClientId::new();
        let mut client = Client::new(client_id, "Test client").unwrap();
        client.activate().unwrap();
        let unit = Unit::new(UnitId::new(), client_id, "Main unit").unwrap();
        let domain = test_domain(client_id);

        let world = Self {
            clients: Arc::new(InMemoryClientRepository::new()),
            units: Arc::new(InMemoryUnitRepository::new()),
            domains: Arc::new(InMemoryDomainRepository::new()),
            elements: Arc::new(InMemoryElementRepository::new()),
            bus: Arc::new(InMemoryEventBus::new()),
            validator: Arc::new(JsonSchemaValidator::new()),
            client_id,
            unit,
            domain,
        };
        world.clients.save(&client).await.unwrap();
        world.units.save(&world.unit).await.unwrap();
        world.domains.save(&world.domain).await.unwrap();
        world
    }

    pub fn salt(&self) -> ETagSalt {
        ETagSalt::new(SALT)
    }

    pub fn metadata(&self) -> CommandMetadata {
        CommandMetadata::test_fixture(self.client_id)
    }

    pub fn admin(&self) -> CommandMetadata {
        self.metadata().with_admin(true)
    }

    /// Caller whose unit access is restricted to the given units.
    pub fn restricted(&self, roles: &[&str], readable: &[UnitId], writable: &[UnitId]) -> CommandMetadata {
        let mut all_roles = vec!["unit_access_restriction".to_string()];
        all_roles.extend(roles.iter().map(|r| r.to_string()));
        CommandMetadata::new(UserAccessRights::new(
            UserId::new("restricted").unwrap(),
            Some(self.client_id),
            all_roles,
            readable.iter().copied().collect(),
            writable.iter().copied().collect(),
        ))
    }

    /// Caller of another client.
    pub fn stranger(&self) -> CommandMetadata {
        CommandMetadata::test_fixture(ClientId::new())
    }

    /// Stores an element of `element_type` in the test unit, associated
    /// with the test domain under `sub_type`.
    pub async fn add_element(&self, element_type: ElementType, sub_type: &str) -> Element {
        let mut e = element(element_type, self.client_id, self.unit.id());
        e.associate_with_domain(self.domain.id(), DomainAssociation::new(sub_type, "NEW"));
        let number = self
            .elements
            .next_designator(&self.client_id, element_type)
            .await
            .unwrap();
        e.assign_designator(number);
        self.elements.save(&e).await.unwrap();
        e
    }

    /// Persists a test modification of `e` as one new version.
    pub async fn store(&self, e: &mut Element) {
        e.touch(&UserId::new("tester").unwrap());
        self.elements.update(e).await.unwrap();
    }

    pub async fn reload(&self, e: &Element) -> Element {
        self.elements.find_by_id(&e.id()).await.unwrap().unwrap()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.bus.event_types()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            clients: self.clients.clone(),
            units: self.units.clone(),
            domains: self.domains.clone(),
            elements: self.elements.clone(),
            event_publisher: self.bus.clone(),
        }
    }

    pub fn transactions(&self) -> Arc<CountingTransactions> {
        Arc::new(CountingTransactions {
            repositories: self.repositories(),
            commits: Arc::new(AtomicUsize::new(0)),
        })
    }
}

/// Transaction manager over the world's repositories that counts commits.
pub struct CountingTransactions {
    repositories: Repositories,
    commits: Arc<AtomicUsize>,
}

impl CountingTransactions {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

struct CountingUnitOfWork {
    repositories: Repositories,
    commits: Arc<AtomicUsize>,
}

#[async_trait]
impl TransactionManager for CountingTransactions {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        Ok(Box::new(CountingUnitOfWork {
            repositories: self.repositories.clone(),
            commits: self.commits.clone(),
        }))
    }
}

#[async_trait]
impl UnitOfWork for CountingUnitOfWork {
    fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Publisher that always fails.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: EventEnvelope) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::CacheError, "publisher unavailable"))
    }
}
