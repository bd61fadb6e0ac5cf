//! GetElementSchemaHandler - JSON schema of one element type in a domain.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::domains::ElementSchemaGenerator;
use crate::domain::foundation::{CommandMetadata, DomainId, ElementType, VeoError};
use crate::ports::DomainRepository;

use super::load_domain;

#[derive(Debug, Clone)]
pub struct GetElementSchemaQuery {
    pub domain_id: DomainId,
    pub element_type: ElementType,
}

pub struct GetElementSchemaHandler {
    domains: Arc<dyn DomainRepository>,
}

impl GetElementSchemaHandler {
    pub fn new(domains: Arc<dyn DomainRepository>) -> Self {
        Self { domains }
    }

    pub async fn handle(&self, query: GetElementSchemaQuery, metadata: CommandMetadata) -> Result<Value, VeoError> {
        let domain = load_domain(self.domains.as_ref(), metadata.rights(), &query.domain_id).await?;
        Ok(ElementSchemaGenerator::generate(query.element_type, &[domain]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use serde_json::json;

    #[tokio::test]
    async fn schema_is_restricted_to_domain() {
        let world = World::new().await;

        let schema = GetElementSchemaHandler::new(world.domains.clone())
            .handle(
                GetElementSchemaQuery {
                    domain_id: world.domain.id(),
                    element_type: ElementType::Person,
                },
                world.metadata(),
            )
            .await
            .unwrap();

        assert_eq!(schema["title"], json!("person"));
        let association = &schema["properties"]["domains"]["properties"][world.domain.id().to_string()];
        assert_eq!(association["properties"]["subType"]["enum"], json!(["PER_Employee", "PER_External"]));
    }
}
