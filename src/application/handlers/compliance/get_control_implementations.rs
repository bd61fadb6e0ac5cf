//! GetControlImplementationsHandler - control implementations filtered by
//! implementing element, control, and purpose.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::domain::load_domain;
use crate::application::handlers::element::{load_accessible, Access};
use crate::application::handlers::support::load_element;
use crate::domain::element::{ControlImplementation, ControlImplementationPurpose, Element};
use crate::domain::foundation::{CommandMetadata, DomainId, ElementId, VeoError};
use crate::ports::{DomainRepository, ElementRepository, PageRequest, PagedResult, UnitRepository};

use super::ElementSummary;

#[derive(Debug, Clone, Default)]
pub struct GetControlImplementationsQuery {
    /// Implementing (risk-affected) element.
    pub element_id: Option<ElementId>,
    pub control_id: Option<ElementId>,
    /// Restricts controls to the sub types the domain configures for a
    /// purpose.
    pub purpose: Option<(DomainId, ControlImplementationPurpose)>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlImplementationEntry {
    pub owner: ElementSummary,
    pub control: ElementSummary,
    pub implementation: ControlImplementation,
}

pub struct GetControlImplementationsHandler {
    units: Arc<dyn UnitRepository>,
    domains: Arc<dyn DomainRepository>,
    elements: Arc<dyn ElementRepository>,
}

impl GetControlImplementationsHandler {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        domains: Arc<dyn DomainRepository>,
        elements: Arc<dyn ElementRepository>,
    ) -> Self {
        Self {
            units,
            domains,
            elements,
        }
    }

    pub async fn handle(
        &self,
        query: GetControlImplementationsQuery,
        metadata: CommandMetadata,
    ) -> Result<PagedResult<ControlImplementationEntry>, VeoError> {
        let rights = metadata.rights();
        let client_id = rights.require_client_id()?;

        let owners: Vec<Element> = match (query.element_id, query.control_id) {
            (Some(element_id), _) => {
                let (element, _) = load_accessible(
                    self.elements.as_ref(),
                    self.units.as_ref(),
                    rights,
                    &element_id,
                    Access::Read,
                )
                .await?;
                vec![element]
            }
            (None, Some(control_id)) => {
                let control = load_element(self.elements.as_ref(), &control_id).await?;
                rights.check_client(&control)?;
                let mut readable = Vec::new();
                for candidate in self.elements.find_referencing(&control_id).await? {
                    if candidate.control_implementation(&control_id).is_none() {
                        continue;
                    }
                    if let Some(unit) = self.units.find_by_id(&candidate.owner()).await? {
                        if rights.check_element_read_access(&unit).is_ok() {
                            readable.push(candidate);
                        }
                    }
                }
                readable
            }
            (None, None) => {
                return Err(VeoError::validation(
                    "query",
                    "Either an element or a control must be given",
                ))
            }
        };

        let control_ids: BTreeSet<ElementId> = owners
            .iter()
            .flat_map(|o| o.control_implementations().iter().map(|ci| ci.control))
            .collect();
        let controls: HashMap<ElementId, Element> = self
            .elements
            .find_by_ids(&control_ids)
            .await?
            .into_iter()
            .map(|c| (c.id(), c))
            .collect();

        let purpose_filter = match query.purpose {
            Some((domain_id, purpose)) => {
                let domain = load_domain(self.domains.as_ref(), rights, &domain_id).await?;
                let sub_types: BTreeSet<String> =
                    domain.control_sub_types(purpose)?.into_iter().collect();
                Some((domain_id, sub_types))
            }
            None => None,
        };

        let mut entries = Vec::new();
        for owner in &owners {
            for ci in owner.control_implementations() {
                if query.control_id.is_some_and(|c| c != ci.control) {
                    continue;
                }
                let Some(control) = controls.get(&ci.control) else {
                    continue;
                };
                if control.client_id() != client_id {
                    continue;
                }
                if let Some((domain_id, sub_types)) = &purpose_filter {
                    let matches = control
                        .sub_type(domain_id)
                        .is_some_and(|s| sub_types.contains(s));
                    if !matches {
                        continue;
                    }
                }
                entries.push(ControlImplementationEntry {
                    owner: owner.into(),
                    control: control.into(),
                    implementation: ci.clone(),
                });
            }
        }
        entries.sort_by(|a, b| {
            a.control
                .name
                .to_lowercase()
                .cmp(&b.control.name.to_lowercase())
                .then(a.owner.name.cmp(&b.owner.name))
        });
        Ok(query.page.apply(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::World;
    use crate::domain::element::NoElements;
    use crate::domain::foundation::ElementType;

    fn handler(world: &World) -> GetControlImplementationsHandler {
        GetControlImplementationsHandler::new(world.units.clone(), world.domains.clone(), world.elements.clone())
    }

    /// An asset implementing one TOM and one requirement control.
    async fn setup(world: &World) -> (Element, Element, Element) {
        let tom = world.add_element(ElementType::Control, "CTL_TOM").await;
        let requirement = world.add_element(ElementType::Control, "CTL_Requirement").await;
        let mut asset = world.add_element(ElementType::Asset, "AST_IT").await;
        asset.implement_control(&tom, &NoElements).unwrap();
        asset.implement_control(&requirement, &NoElements).unwrap();
        world.store(&mut asset).await;
        (asset, tom, requirement)
    }

    #[tokio::test]
    async fn lists_implementations_of_element() {
        let world = World::new().await;
        let (asset, _, _) = setup(&world).await;

        let page = handler(&world)
            .handle(
                GetControlImplementationsQuery {
                    element_id: Some(asset.id()),
                    ..Default::default()
                },
                world.metadata(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|e| e.owner.id == asset.id()));
    }

    #[tokio::test]
    async fn purpose_selects_configured_sub_types() {
        let world = World::new().await;
        let (asset, tom, _) = setup(&world).await;

        let page = handler(&world)
            .handle(
                GetControlImplementationsQuery {
                    element_id: Some(asset.id()),
                    purpose: Some((world.domain.id(), ControlImplementationPurpose::Mitigation)),
                    ..Default::default()
                },
                world.metadata(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].control.id, tom.id());
    }

    #[tokio::test]
    async fn finds_implementers_of_control() {
        let world = World::new().await;
        let (asset, _, requirement) = setup(&world).await;

        let page = handler(&world)
            .handle(
                GetControlImplementationsQuery {
                    control_id: Some(requirement.id()),
                    ..Default::default()
                },
                world.metadata(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].owner.id, asset.id());
    }

    #[tokio::test]
    async fn missing_filters_are_rejected() {
        let world = World::new().await;

        let result = handler(&world)
            .handle(GetControlImplementationsQuery::default(), world.metadata())
            .await;

        assert!(matches!(result, Err(VeoError::ValidationFailed { .. })));
    }
}
