use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::domains::Domain;
use crate::domain::foundation::{ClientId, DomainError, DomainId};
use crate::ports::DomainRepository;

use super::{already_exists, not_found, stale};

#[derive(Default)]
pub struct InMemoryDomainRepository {
    domains: RwLock<HashMap<DomainId, Domain>>,
}

impl InMemoryDomainRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository preloaded with `domains`, for tests and seeding.
    pub fn with_domains(domains: impl IntoIterator<Item = Domain>) -> Self {
        Self {
            domains: RwLock::new(domains.into_iter().map(|d| (d.id(), d)).collect()),
        }
    }

    async fn filtered(&self, keep: impl Fn(&Domain) -> bool) -> Vec<Domain> {
        let domains = self.domains.read().await;
        let mut found: Vec<Domain> = domains.values().filter(|d| keep(d)).cloned().collect();
        found.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        found
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn save(&self, domain: &Domain) -> Result<(), DomainError> {
        let mut domains = self.domains.write().await;
        if domains.contains_key(&domain.id()) {
            return Err(already_exists("Domain", domain.id()));
        }
        domains.insert(domain.id(), domain.clone());
        Ok(())
    }

    async fn update(&self, domain: &Domain) -> Result<(), DomainError> {
        let mut domains = self.domains.write().await;
        match domains.get_mut(&domain.id()) {
            Some(stored) if stored.version() != domain.version() - 1 => Err(stale(
                "Domain",
                domain.id(),
                stored.version(),
                domain.version(),
            )),
            Some(stored) => {
                *stored = domain.clone();
                Ok(())
            }
            None => Err(not_found("Domain", domain.id())),
        }
    }

    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>, DomainError> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn find_active_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError> {
        Ok(self
            .filtered(|d| &d.client_id() == client_id && d.is_active())
            .await)
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError> {
        Ok(self.filtered(|d| &d.client_id() == client_id).await)
    }

    async fn delete(&self, id: &DomainId) -> Result<(), DomainError> {
        self.domains
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Domain", id))
    }
}
