use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::element::Element;
use crate::domain::foundation::{ClientId, DomainError, DomainId, ElementId, ElementType, UnitId};
use crate::ports::{ElementQuery, ElementRepository, PageRequest, PagedResult};

use super::{already_exists, not_found, stale};

#[derive(Default)]
pub struct InMemoryElementRepository {
    elements: RwLock<HashMap<ElementId, Element>>,
    designators: RwLock<HashMap<(ClientId, ElementType), u64>>,
}

impl InMemoryElementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.elements.read().await.len()
    }
}

#[async_trait]
impl ElementRepository for InMemoryElementRepository {
    async fn save(&self, element: &Element) -> Result<(), DomainError> {
        let mut elements = self.elements.write().await;
        if elements.contains_key(&element.id()) {
            return Err(already_exists("Element", element.id()));
        }
        elements.insert(element.id(), element.clone());
        Ok(())
    }

    async fn update(&self, element: &Element) -> Result<(), DomainError> {
        let mut elements = self.elements.write().await;
        match elements.get_mut(&element.id()) {
            Some(stored) if stored.version() != element.version() - 1 => Err(stale(
                "Element",
                element.id(),
                stored.version(),
                element.version(),
            )),
            Some(stored) => {
                *stored = element.clone();
                Ok(())
            }
            None => Err(not_found("Element", element.id())),
        }
    }

    async fn find_by_id(&self, id: &ElementId) -> Result<Option<Element>, DomainError> {
        Ok(self.elements.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &BTreeSet<ElementId>) -> Result<Vec<Element>, DomainError> {
        let elements = self.elements.read().await;
        Ok(ids.iter().filter_map(|id| elements.get(id).cloned()).collect())
    }

    async fn find_by_unit(&self, unit_id: &UnitId) -> Result<Vec<Element>, DomainError> {
        let elements = self.elements.read().await;
        Ok(elements
            .values()
            .filter(|e| &e.owner() == unit_id)
            .cloned()
            .collect())
    }

    async fn find_by_domain(
        &self,
        client_id: &ClientId,
        domain: &DomainId,
    ) -> Result<Vec<Element>, DomainError> {
        let elements = self.elements.read().await;
        Ok(elements
            .values()
            .filter(|e| &e.client_id() == client_id && e.is_associated_with(domain))
            .cloned()
            .collect())
    }

    async fn query(
        &self,
        query: &ElementQuery,
        page: PageRequest,
    ) -> Result<PagedResult<Element>, DomainError> {
        let candidates: Vec<Element> = self
            .elements
            .read()
            .await
            .values()
            .filter(|e| query.client_id.map_or(true, |c| c == e.client_id()))
            .cloned()
            .collect();
        Ok(query.run(candidates, &page))
    }

    async fn find_referencing(&self, target: &ElementId) -> Result<Vec<Element>, DomainError> {
        let elements = self.elements.read().await;
        Ok(elements
            .values()
            .filter(|e| e.id() != *target && e.referenced_elements().contains(target))
            .cloned()
            .collect())
    }

    async fn find_composites_of(&self, part: &ElementId) -> Result<Vec<Element>, DomainError> {
        let elements = self.elements.read().await;
        Ok(elements
            .values()
            .filter(|e| e.parts().contains(part) || e.members().contains(part))
            .cloned()
            .collect())
    }

    async fn next_designator(
        &self,
        client_id: &ClientId,
        element_type: ElementType,
    ) -> Result<u64, DomainError> {
        let mut designators = self.designators.write().await;
        let counter = designators.entry((*client_id, element_type)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn delete(&self, id: &ElementId) -> Result<(), DomainError> {
        self.elements
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Element", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::aggregate::fixtures::element;
    use crate::domain::element::{CustomLink, DomainAssociation};
    use crate::domain::foundation::{ErrorCode, UserId};
    use crate::ports::{SortColumn, SortDirection};

    async fn seeded(elements: &[Element]) -> InMemoryElementRepository {
        let repo = InMemoryElementRepository::new();
        for e in elements {
            repo.save(e).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn update_requires_exactly_one_version_step() {
        let user = UserId::new("u").unwrap();
        let original = element(ElementType::Asset, ClientId::new(), UnitId::new());
        let repo = seeded(&[original.clone()]).await;
        let mut first = original.clone();
        let mut second = original.clone();

        first.rename("First").unwrap();
        first.touch(&user);
        repo.update(&first).await.unwrap();

        second.rename("Second").unwrap();
        second.touch(&user);
        let err = repo.update(&second).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ETagMismatch);
        assert_eq!(err.details.get("id"), Some(&original.id().to_string()));
        let stored = repo.find_by_id(&original.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), "First");
        assert_eq!(stored.version(), 1);
        assert_eq!(repo.update(&stored).await.unwrap_err().code, ErrorCode::ETagMismatch);
    }

    #[tokio::test]
    async fn designators_count_per_client_and_type() {
        let repo = InMemoryElementRepository::new();
        let client = ClientId::new();

        assert_eq!(repo.next_designator(&client, ElementType::Asset).await.unwrap(), 1);
        assert_eq!(repo.next_designator(&client, ElementType::Asset).await.unwrap(), 2);
        assert_eq!(repo.next_designator(&client, ElementType::Person).await.unwrap(), 1);
        assert_eq!(repo.next_designator(&ClientId::new(), ElementType::Asset).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn query_sorts_and_pages() {
        let client = ClientId::new();
        let unit = UnitId::new();
        let mut elements = Vec::new();
        for (i, name) in ["Charlie", "alpha", "Bravo"].iter().enumerate() {
            let mut e = element(ElementType::Asset, client, unit);
            e.rename(*name).unwrap();
            e.assign_designator(i as u64 + 9);
            elements.push(e);
        }
        let repo = seeded(&elements).await;

        let page = repo
            .query(&ElementQuery::for_client(client), PageRequest::new(0, 2))
            .await
            .unwrap();
        assert_eq!(page.items.iter().map(Element::name).collect::<Vec<_>>(), vec!["alpha", "Bravo"]);
        assert_eq!(page.total, 3);

        let by_designator = repo
            .query(
                &ElementQuery::for_client(client),
                PageRequest::new(0, 10).sorted_by(SortColumn::Designator, SortDirection::Desc),
            )
            .await
            .unwrap();
        assert_eq!(by_designator.items[0].designator(), "AST-11");
        assert_eq!(by_designator.items[2].designator(), "AST-9");
    }

    #[tokio::test]
    async fn query_filters_parents_and_scopes() {
        let client = ClientId::new();
        let unit = UnitId::new();
        let part = element(ElementType::Asset, client, unit);
        let mut composite = element(ElementType::Asset, client, unit);
        composite.set_parts([part.id()].into_iter().collect()).unwrap();
        let mut scope = element(ElementType::Scope, client, unit);
        scope.set_members([composite.id()].into_iter().collect()).unwrap();
        let repo = seeded(&[part.clone(), composite.clone(), scope.clone()]).await;

        let query = ElementQuery {
            has_parent_elements: Some(false),
            ..ElementQuery::for_client(client)
        };
        let roots = repo.query(&query, PageRequest::default()).await.unwrap();
        assert_eq!(roots.items.iter().map(Element::id).collect::<BTreeSet<_>>(), [scope.id()].into());

        let query = ElementQuery {
            scope: Some(scope.id()),
            ..ElementQuery::for_client(client)
        };
        let members = repo.query(&query, PageRequest::default()).await.unwrap();
        assert_eq!(members.items.len(), 1);
        assert_eq!(members.items[0].id(), composite.id());
    }

    #[tokio::test]
    async fn finds_referencing_elements_and_composites() {
        let client = ClientId::new();
        let unit = UnitId::new();
        let domain = DomainId::new();
        let person = element(ElementType::Person, client, unit);
        let mut asset = element(ElementType::Asset, client, unit);
        asset.associate_with_domain(
            domain,
            DomainAssociation::new("AST_IT", "NEW").with_link("asset_owner", CustomLink::new(person.id())),
        );
        let mut group = element(ElementType::Person, client, unit);
        group.set_parts([person.id()].into_iter().collect()).unwrap();
        let repo = seeded(&[person.clone(), asset.clone(), group.clone()]).await;

        let referencing = repo.find_referencing(&person.id()).await.unwrap();
        let composites = repo.find_composites_of(&person.id()).await.unwrap();

        assert_eq!(referencing.len(), 2);
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].id(), group.id());
    }
}
