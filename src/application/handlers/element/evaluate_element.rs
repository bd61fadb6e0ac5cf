//! EvaluateElementHandler - runs decisions and inspections of one domain
//! without persisting anything.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::application::handlers::support::load_unit;
use crate::domain::decision::{Decider, DecisionResult};
use crate::domain::element::Element;
use crate::domain::foundation::{CommandMetadata, DomainId, ElementId, ElementType, VeoError};
use crate::domain::inspection::{Finding, Inspector};
use crate::ports::{DomainRepository, ElementRepository, ElementSchemaValidator, UnitRepository};

use super::{load_accessible, Access, ControlImplementationService, ElementContext, ElementInput};

#[derive(Debug, Clone)]
pub enum EvaluationTarget {
    /// A stored element as it is.
    Stored(ElementId),
    /// A payload that has not been saved yet.
    Transient { element_type: ElementType, payload: Value },
}

#[derive(Debug, Clone)]
pub struct EvaluateElementCommand {
    pub domain_id: DomainId,
    pub target: EvaluationTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub decision_results: BTreeMap<String, DecisionResult>,
    pub inspection_findings: Vec<Finding>,
}

pub struct EvaluateElementHandler {
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    elements: Arc<dyn ElementRepository>,
    validator: Arc<dyn ElementSchemaValidator>,
}

impl EvaluateElementHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        elements: Arc<dyn ElementRepository>,
        validator: Arc<dyn ElementSchemaValidator>,
    ) -> Self {
        Self {
            units,
            domains,
            elements,
            validator,
        }
    }

    pub async fn handle(
        &self,
        cmd: EvaluateElementCommand,
        metadata: CommandMetadata,
    ) -> Result<EvaluationResult, VeoError> {
        let rights = metadata.rights();
        let client_id = rights.require_client_id()?;

        let element = match cmd.target {
            EvaluationTarget::Stored(id) => {
                load_accessible(
                    self.elements.as_ref(),
                    self.units.as_ref(),
                    rights,
                    &id,
                    Access::Read,
                )
                .await?
                .0
            }
            EvaluationTarget::Transient {
                element_type,
                payload,
            } => {
                let active = self.domains.find_active_by_client(&client_id).await?;
                let input = ElementInput::parse(self.validator.as_ref(), element_type, &active, payload)?;
                let unit = load_unit(self.units.as_ref(), &input.owner).await?;
                rights.check_element_read_access(&unit)?;

                let mut element = Element::new(
                    ElementId::new(),
                    element_type,
                    input.owner,
                    client_id,
                    input.name.clone(),
                    metadata.user_id(),
                )?;
                input.apply_to(&mut element)?;
                if element_type.is_risk_affected() {
                    ControlImplementationService::new(self.elements.clone())
                        .apply(&mut element, &input.control_implementations)
                        .await?;
                }
                element
            }
        };

        let context =
            ElementContext::load(self.domains.as_ref(), self.elements.as_ref(), &client_id, &element)
                .await?;
        context.validate(&element)?;
        let domain = context
            .domain(&cmd.domain_id)
            .ok_or_else(|| VeoError::not_found("Domain", cmd.domain_id))?;

        Ok(EvaluationResult {
            decision_results: Decider::decide(&element, domain, &context.references),
            inspection_findings: Inspector::inspect(&element, domain, &context.references),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::inspection::Severity;
    use serde_json::json;

    fn handler(world: &World) -> EvaluateElementHandler {
        EvaluateElementHandler::new(
            world.units.clone(),
            world.domains.clone(),
            world.elements.clone(),
            world.validator.clone(),
        )
    }

    fn transient_asset(world: &World, number: i64) -> EvaluateElementCommand {
        EvaluateElementCommand {
            domain_id: world.domain.id(),
            target: EvaluationTarget::Transient {
                element_type: ElementType::Asset,
                payload: json!({
                    "name": "Draft",
                    "owner": world.unit.id().to_string(),
                    "domains": {
                        world.domain.id().to_string(): {
                            "subType": "AST_IT",
                            "status": "NEW",
                            "customAspects": {"asset_details": {"asset_details_number": number}}
                        }
                    }
                }),
            },
        }
    }

    #[tokio::test]
    async fn evaluates_transient_element_without_saving() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(transient_asset(&world, 1), world.metadata())
            .await
            .unwrap();

        assert_eq!(result.decision_results["asset_critical"].value, Some(true));
        assert_eq!(result.inspection_findings.len(), 1);
        assert_eq!(result.inspection_findings[0].severity, Severity::Warning);
        assert_eq!(world.elements.len().await, 0);
        assert!(world.event_types().is_empty());
    }

    #[tokio::test]
    async fn default_result_applies_when_no_rule_matches() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(transient_asset(&world, 2), world.metadata())
            .await
            .unwrap();

        assert_eq!(result.decision_results["asset_critical"].value, Some(false));
    }

    #[tokio::test]
    async fn evaluates_stored_element() {
        let world = World::new().await;
        let asset = world.add_element(ElementType::Asset, "AST_IT").await;

        let result = handler(&world)
            .handle(
                EvaluateElementCommand {
                    domain_id: world.domain.id(),
                    target: EvaluationTarget::Stored(asset.id()),
                },
                world.metadata(),
            )
            .await
            .unwrap();

        assert_eq!(result.inspection_findings.len(), 1);
    }

    #[tokio::test]
    async fn unknown_domain_is_not_found() {
        let world = World::new().await;
        let mut cmd = transient_asset(&world, 1);
        cmd.domain_id = DomainId::new();

        let result = handler(&world).handle(cmd, world.metadata()).await;

        assert!(matches!(result, Err(VeoError::NotFound { entity: "Domain", .. })));
    }
}
