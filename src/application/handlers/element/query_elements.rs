//! QueryElementsHandler - filtered, paged element lists.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::element::Element;
use crate::domain::foundation::{CommandMetadata, UnitId, VeoError};
use crate::ports::{ElementQuery, ElementRepository, PageRequest, PagedResult};

#[derive(Debug, Clone, Default)]
pub struct QueryElementsQuery {
    pub filter: ElementQuery,
    pub page: PageRequest,
}

pub struct QueryElementsHandler {
    elements: Arc<dyn ElementRepository>,
}

impl QueryElementsHandler {
    pub fn new(elements: Arc<dyn ElementRepository>) -> Self {
        Self { elements }
    }

    /// Runs the query within the caller's client. Restricted users only
    /// see elements of units they can read.
    pub async fn handle(
        &self,
        query: QueryElementsQuery,
        metadata: CommandMetadata,
    ) -> Result<PagedResult<Element>, VeoError> {
        let rights = metadata.rights();
        let mut filter = query.filter;
        filter.client_id = Some(rights.require_client_id()?);

        if rights.is_unit_access_restricted() {
            let visible: BTreeSet<UnitId> = rights
                .readable_unit_ids()
                .iter()
                .chain(rights.writable_unit_ids())
                .copied()
                .collect();
            filter.units = Some(match filter.units.take() {
                Some(requested) => requested.intersection(&visible).copied().collect(),
                None => visible,
            });
        }

        Ok(self.elements.query(&filter, query.page).await?)
    }
}
