//! GetDomainHandler

use std::sync::Arc;

use crate::domain::domains::Domain;
use crate::domain::foundation::{CommandMetadata, DomainId, VeoError};
use crate::ports::DomainRepository;

use super::load_domain;

#[derive(Debug, Clone)]
pub struct GetDomainQuery {
    pub domain_id: DomainId,
}

pub struct GetDomainHandler {
    domains: Arc<dyn DomainRepository>,
}

impl GetDomainHandler {
    pub fn new(domains: Arc<dyn DomainRepository>) -> Self {
        Self { domains }
    }

    pub async fn handle(&self, query: GetDomainQuery, metadata: CommandMetadata) -> Result<Domain, VeoError> {
        load_domain(self.domains.as_ref(), metadata.rights(), &query.domain_id).await
    }
}
