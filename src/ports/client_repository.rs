//! Client repository port.

use async_trait::async_trait;

use crate::domain::client::Client;
use crate::domain::foundation::{ClientId, DomainError};

/// Repository port for Client aggregate persistence.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Save a new client.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a client with this id exists
    /// - `DatabaseError` on persistence failure
    async fn save(&self, client: &Client) -> Result<(), DomainError>;

    /// Update an existing client.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the client doesn't exist
    async fn update(&self, client: &Client) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError>;

    async fn exists(&self, id: &ClientId) -> Result<bool, DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the client doesn't exist
    async fn delete(&self, id: &ClientId) -> Result<(), DomainError>;
}
