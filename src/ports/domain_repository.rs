//! Domain repository port.

use async_trait::async_trait;

use crate::domain::domains::Domain;
use crate::domain::foundation::{ClientId, DomainError, DomainId};

/// Repository port for Domain aggregate persistence.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn save(&self, domain: &Domain) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the domain doesn't exist
    async fn update(&self, domain: &Domain) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>, DomainError>;

    /// Active domains of a client, ordered by name.
    async fn find_active_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError>;

    /// All domains of a client, including inactive ones.
    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError>;

    async fn delete(&self, id: &DomainId) -> Result<(), DomainError>;
}
