use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::client::Client;
use crate::domain::foundation::{ClientId, DomainError};
use crate::ports::ClientRepository;

use super::{already_exists, not_found, stale};

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<ClientId, Client>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn save(&self, client: &Client) -> Result<(), DomainError> {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&client.id()) {
            return Err(already_exists("Client", client.id()));
        }
        clients.insert(client.id(), client.clone());
        Ok(())
    }

    async fn update(&self, client: &Client) -> Result<(), DomainError> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(&client.id()) {
            Some(stored) if stored.version() != client.version() - 1 => Err(stale(
                "Client",
                client.id(),
                stored.version(),
                client.version(),
            )),
            Some(stored) => {
                *stored = client.clone();
                Ok(())
            }
            None => Err(not_found("Client", client.id())),
        }
    }

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn exists(&self, id: &ClientId) -> Result<bool, DomainError> {
        Ok(self.clients.read().await.contains_key(id))
    }

    async fn delete(&self, id: &ClientId) -> Result<(), DomainError> {
        self.clients
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Client", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[tokio::test]
    async fn save_rejects_duplicate_ids() {
        let repo = InMemoryClientRepository::new();
        let client = Client::new(ClientId::new(), "Acme").unwrap();

        repo.save(&client).await.unwrap();
        let err = repo.save(&client).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert!(repo.exists(&client.id()).await.unwrap());
    }

    #[tokio::test]
    async fn stale_client_update_is_rejected() {
        let repo = InMemoryClientRepository::new();
        let client = Client::new(ClientId::new(), "Acme").unwrap();
        repo.save(&client).await.unwrap();

        let mut renamed = client.clone();
        renamed.rename("Acme Corp").unwrap();
        renamed.touch();
        repo.update(&renamed).await.unwrap();

        let mut stale = client.clone();
        stale.activate().unwrap();
        stale.touch();
        assert_eq!(repo.update(&stale).await.unwrap_err().code, ErrorCode::ETagMismatch);
    }

    #[tokio::test]
    async fn delete_unknown_client_is_not_found() {
        let repo = InMemoryClientRepository::new();
        let err = repo.delete(&ClientId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
