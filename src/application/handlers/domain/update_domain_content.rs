//! UpdateDomainContentHandler - saves or removes one piece of domain
//! content: an element type definition, a decision, an inspection, or a
//! risk definition.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::support::{publish, require_content_creator};
use crate::domain::decision::Decision;
use crate::domain::domains::{DomainContentUpdated, ElementTypeDefinition, RiskDefinition};
use crate::domain::foundation::{
    CommandMetadata, DomainId, ElementType, EventId, SerializableDomainEvent, Timestamp, VeoError,
};
use crate::domain::inspection::Inspection;
use crate::ports::{DomainRepository, EventPublisher};

use super::load_domain;

#[derive(Debug, Clone)]
pub enum DomainContentChange {
    ElementTypeDefinition {
        element_type: ElementType,
        definition: ElementTypeDefinition,
    },
    SaveDecision { key: String, decision: Decision },
    DeleteDecision { key: String },
    SaveInspection { key: String, inspection: Inspection },
    DeleteInspection { key: String },
    SaveRiskDefinition { definition: RiskDefinition },
}

impl DomainContentChange {
    fn content(&self) -> String {
        match self {
            Self::ElementTypeDefinition { element_type, .. } => {
                format!("element-type-definition:{}", element_type.singular_term())
            }
            Self::SaveDecision { key, .. } | Self::DeleteDecision { key } => format!("decision:{}", key),
            Self::SaveInspection { key, .. } | Self::DeleteInspection { key } => {
                format!("inspection:{}", key)
            }
            Self::SaveRiskDefinition { definition } => format!("risk-definition:{}", definition.id),
        }
    }

    fn is_removal(&self) -> bool {
        matches!(self, Self::DeleteDecision { .. } | Self::DeleteInspection { .. })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateDomainContentCommand {
    pub domain_id: DomainId,
    pub change: DomainContentChange,
}

/// Whether a save created new content or replaced existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSaved {
    Created,
    Replaced,
    Removed,
}

pub struct UpdateDomainContentHandler {
    domains: Arc<dyn DomainRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl UpdateDomainContentHandler {
    pub fn new(domains: Arc<dyn DomainRepository>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            domains,
            event_publisher,
        }
    }

    /// # Errors
    ///
    /// - `NotAllowed` without the content creator role
    /// - `NotFound` for unknown or inactive domains and for removals of
    ///   content that does not exist
    /// - `Unprocessable` if the domain is inconsistent after the change,
    ///   e.g. a decision referring to a sub type that is no longer defined
    pub async fn handle(
        &self,
        cmd: UpdateDomainContentCommand,
        metadata: CommandMetadata,
    ) -> Result<ContentSaved, VeoError> {
        require_content_creator(&metadata)?;
        let mut domain = load_domain(self.domains.as_ref(), metadata.rights(), &cmd.domain_id).await?;
        if !domain.is_active() {
            return Err(VeoError::inactive_domain());
        }

        let content = cmd.change.content();
        let removed = cmd.change.is_removal();
        let replaced = match cmd.change {
            DomainContentChange::ElementTypeDefinition {
                element_type,
                definition,
            } => {
                let existed = domain.element_type_definition(element_type).is_some();
                domain.set_element_type_definition(element_type, definition);
                existed
            }
            DomainContentChange::SaveDecision { key, decision } => domain.put_decision(key, decision),
            DomainContentChange::DeleteDecision { key } => {
                domain
                    .remove_decision(&key)
                    .ok_or_else(|| VeoError::not_found("Decision", &key))?;
                true
            }
            DomainContentChange::SaveInspection { key, inspection } => {
                domain.put_inspection(key, inspection)
            }
            DomainContentChange::DeleteInspection { key } => {
                domain
                    .remove_inspection(&key)
                    .ok_or_else(|| VeoError::not_found("Inspection", &key))?;
                true
            }
            DomainContentChange::SaveRiskDefinition { definition } => {
                domain.put_risk_definition(definition)
            }
        };
        domain
            .validate()
            .map_err(|e| VeoError::unprocessable(e.message))?;

        domain.touch();
        self.domains.update(&domain).await?;
        info!(domain_id = %domain.id(), content = %content, removed, "Domain content updated");

        let event = DomainContentUpdated {
            event_id: EventId::new(),
            domain_id: domain.id(),
            client_id: domain.client_id(),
            content,
            removed,
            updated_at: Timestamp::now(),
        };
        publish(self.event_publisher.as_ref(), &metadata, vec![event.to_envelope()]).await?;

        Ok(match (removed, replaced) {
            (true, _) => ContentSaved::Removed,
            (false, true) => ContentSaved::Replaced,
            (false, false) => ContentSaved::Created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::domains::SubTypeDefinition;

    fn handler(world: &World) -> UpdateDomainContentHandler {
        UpdateDomainContentHandler::new(world.domains.clone(), world.bus.clone())
    }

    fn command(world: &World, change: DomainContentChange) -> UpdateDomainContentCommand {
        UpdateDomainContentCommand {
            domain_id: world.domain.id(),
            change,
        }
    }

    async fn stored(world: &World) -> crate::domain::domains::Domain {
        world.domains.find_by_id(&world.domain.id()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn element_type_definition_is_replaced() {
        let world = World::new().await;
        let mut definition = world
            .domain
            .element_type_definition(ElementType::Document)
            .unwrap()
            .clone();
        definition
            .sub_types
            .insert("DOC_Policy".into(), SubTypeDefinition::new(["DRAFT", "RELEASED"]));
        let change = DomainContentChange::ElementTypeDefinition {
            element_type: ElementType::Document,
            definition,
        };

        let saved = handler(&world).handle(command(&world, change), world.admin()).await.unwrap();

        assert_eq!(saved, ContentSaved::Replaced);
        let domain = stored(&world).await;
        let documents = domain.element_type_definition(ElementType::Document).unwrap();
        assert!(documents.sub_type("DOC_Policy").is_some());
        assert_eq!(domain.version(), world.domain.version() + 1);
        assert_eq!(world.event_types(), vec!["domain.content_updated.v1"]);
    }

    #[tokio::test]
    async fn decision_is_saved_and_deleted() {
        let world = World::new().await;
        let decision = world.domain.decision("asset_critical").unwrap().clone();
        let h = handler(&world);

        let saved = h
            .handle(
                command(&world, DomainContentChange::SaveDecision { key: "asset_important".into(), decision }),
                world.admin(),
            )
            .await
            .unwrap();
        assert_eq!(saved, ContentSaved::Created);
        assert!(stored(&world).await.decision("asset_important").is_some());

        let removed = h
            .handle(
                command(&world, DomainContentChange::DeleteDecision { key: "asset_important".into() }),
                world.admin(),
            )
            .await
            .unwrap();
        assert_eq!(removed, ContentSaved::Removed);
        let domain = stored(&world).await;
        assert!(domain.decision("asset_important").is_none());
        assert_eq!(domain.version(), world.domain.version() + 2);
    }

    #[tokio::test]
    async fn deleting_unknown_inspection_is_not_found() {
        let world = World::new().await;
        let change = DomainContentChange::DeleteInspection { key: "nope".into() };

        let result = handler(&world).handle(command(&world, change), world.admin()).await;

        assert!(matches!(result, Err(VeoError::NotFound { entity: "Inspection", .. })));
        assert!(world.event_types().is_empty());
    }

    #[tokio::test]
    async fn removing_a_sub_type_used_by_a_decision_is_unprocessable() {
        let world = World::new().await;
        let mut definition = world
            .domain
            .element_type_definition(ElementType::Asset)
            .unwrap()
            .clone();
        definition.sub_types.remove("AST_IT");
        let change = DomainContentChange::ElementTypeDefinition {
            element_type: ElementType::Asset,
            definition,
        };

        let result = handler(&world).handle(command(&world, change), world.admin()).await;

        assert!(matches!(result, Err(VeoError::Unprocessable(_))));
        assert_eq!(stored(&world).await, world.domain);
    }

    #[tokio::test]
    async fn risk_definition_is_replaced_by_id() {
        let world = World::new().await;
        let definition = world.domain.risk_definition("DSRA").unwrap().clone();

        let saved = handler(&world)
            .handle(
                command(&world, DomainContentChange::SaveRiskDefinition { definition }),
                world.admin(),
            )
            .await
            .unwrap();

        assert_eq!(saved, ContentSaved::Replaced);
    }

    #[tokio::test]
    async fn inactive_domain_cannot_be_edited() {
        let world = World::new().await;
        let mut domain = world.domain.clone();
        domain.deactivate();
        domain.touch();
        world.domains.update(&domain).await.unwrap();
        let change = DomainContentChange::DeleteDecision { key: "asset_critical".into() };

        let result = handler(&world).handle(command(&world, change), world.admin()).await;

        assert_eq!(result.unwrap_err(), VeoError::inactive_domain());
    }

    #[tokio::test]
    async fn plain_users_cannot_edit_content() {
        let world = World::new().await;
        let change = DomainContentChange::DeleteDecision { key: "asset_critical".into() };

        let result = handler(&world).handle(command(&world, change), world.metadata()).await;

        assert!(matches!(result, Err(VeoError::NotAllowed(_))));
    }
}
