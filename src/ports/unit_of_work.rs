//! UnitOfWork port - groups the writes of one use case.
//!
//! Everything a use case saves through the repositories of a unit of
//! work, including the outbox rows its events become, is committed
//! together. Dropping a unit of work without committing discards it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

use super::{ClientRepository, DomainRepository, ElementRepository, EventPublisher, UnitRepository};

/// Repositories and event publisher sharing one unit of work.
#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub domains: Arc<dyn DomainRepository>,
    pub elements: Arc<dyn ElementRepository>,
    pub event_publisher: Arc<dyn EventPublisher>,
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn repositories(&self) -> &Repositories;

    /// Makes every write of this unit of work visible.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if the commit fails; nothing is written then
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Starts units of work.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError>;
}
