//! ElementStatusCountHandler - element counts of a unit per type, sub type,
//! and status within one domain.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::error;

use crate::application::handlers::support::load_unit;
use crate::domain::foundation::{CommandMetadata, DomainId, ElementType, UnitId, VeoError};
use crate::ports::{DomainRepository, ElementRepository, UnitRepository};

use super::load_domain;

#[derive(Debug, Clone)]
pub struct ElementStatusCountQuery {
    pub domain_id: DomainId,
    pub unit_id: UnitId,
}

/// type -> sub type -> status -> count. Every sub type and status the
/// domain defines is present, with zero when no element matches.
pub type ElementStatusCount = BTreeMap<ElementType, BTreeMap<String, BTreeMap<String, u64>>>;

pub struct ElementStatusCountHandler {
    domains: Arc<dyn DomainRepository>,
    units: Arc<dyn UnitRepository>,
    elements: Arc<dyn ElementRepository>,
}

impl ElementStatusCountHandler {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        units: Arc<dyn UnitRepository>,
        elements: Arc<dyn ElementRepository>,
    ) -> Self {
        Self {
            domains,
            units,
            elements,
        }
    }

    pub async fn handle(
        &self,
        query: ElementStatusCountQuery,
        metadata: CommandMetadata,
    ) -> Result<ElementStatusCount, VeoError> {
        let rights = metadata.rights();
        let domain = load_domain(self.domains.as_ref(), rights, &query.domain_id).await?;
        if !domain.is_active() {
            return Err(VeoError::inactive_domain());
        }
        let unit = load_unit(self.units.as_ref(), &query.unit_id).await?;
        rights.check_element_read_access(&unit)?;

        let mut counts: ElementStatusCount = domain
            .element_type_definitions()
            .iter()
            .map(|(element_type, definition)| {
                let sub_types = definition
                    .sub_types
                    .iter()
                    .map(|(sub_type, def)| {
                        let statuses = def.statuses.iter().map(|s| (s.clone(), 0)).collect();
                        (sub_type.clone(), statuses)
                    })
                    .collect();
                (*element_type, sub_types)
            })
            .collect();

        for element in self.elements.find_by_unit(&unit.id()).await? {
            let Some(association) = element.association(&domain.id()) else {
                continue;
            };
            let slot = counts
                .get_mut(&element.element_type())
                .and_then(|sub_types| sub_types.get_mut(&association.sub_type))
                .and_then(|statuses| statuses.get_mut(&association.status));
            match slot {
                Some(count) => *count += 1,
                None => error!(
                    element_id = %element.id(),
                    sub_type = %association.sub_type,
                    status = %association.status,
                    domain_id = %domain.id(),
                    "Element has a sub type or status unknown to its domain"
                ),
            }
        }
        Ok(counts)
    }
}
