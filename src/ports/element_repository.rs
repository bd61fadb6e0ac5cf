//! Element repository port.
//!
//! Elements of every type live in one repository. Besides CRUD it answers
//! the filtered, paged queries of the element list endpoint and the
//! reverse lookups needed when an element is deleted (who links to it,
//! which composites contain it).

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::element::Element;
use crate::domain::foundation::{ClientId, DomainError, DomainId, ElementId, ElementType, UnitId};

/// Sortable element properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    #[default]
    Name,
    Designator,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortColumn,
    pub direction: SortDirection,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 10_000;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
            sort: SortColumn::default(),
            direction: SortDirection::default(),
        }
    }

    pub fn sorted_by(mut self, sort: SortColumn, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    /// Sorts by the requested column, ties broken by id.
    pub fn order(&self, elements: &mut [Element]) {
        elements.sort_by(|a, b| {
            let ordering = match self.sort {
                SortColumn::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
                SortColumn::Designator => designator_key(a).cmp(&designator_key(b)),
                SortColumn::UpdatedAt => a.updated_at().cmp(b.updated_at()),
            };
            let ordering = ordering.then(a.id().cmp(&b.id()));
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }

    /// Cuts one page out of an already sorted result.
    pub fn apply<T>(&self, items: Vec<T>) -> PagedResult<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.size as usize)
            .collect();
        PagedResult {
            items,
            total,
            page: self.page,
            size: self.size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// `AST-10` sorts after `AST-9`.
fn designator_key(element: &Element) -> (String, u64) {
    match element.designator().rsplit_once('-') {
        Some((prefix, number)) => (prefix.to_string(), number.parse().unwrap_or(0)),
        None => (element.designator().to_string(), 0),
    }
}

/// One page of results plus the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        let size = self.size as u64;
        (self.total + size - 1) / size
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// Filters of an element query. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementQuery {
    pub client_id: Option<ClientId>,
    /// Restricts to these units (readable units of restricted users).
    pub units: Option<BTreeSet<UnitId>>,
    pub element_types: Option<BTreeSet<ElementType>>,
    pub domain: Option<DomainId>,
    pub sub_type: Option<String>,
    pub status: Option<String>,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub description: Option<String>,
    pub designator: Option<String>,
    pub updated_by: Option<String>,
    pub has_child_elements: Option<bool>,
    pub has_parent_elements: Option<bool>,
    /// Only members of this scope.
    pub scope: Option<ElementId>,
    pub ids: Option<BTreeSet<ElementId>>,
}

impl ElementQuery {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    /// In-process evaluation of every filter that only needs the element.
    ///
    /// `has_parent_elements` and `scope` depend on other elements and are
    /// left to the repository.
    pub fn matches(&self, element: &Element) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
                None => true,
            }
        }

        if self.client_id.is_some_and(|c| c != element.client_id()) {
            return false;
        }
        if let Some(units) = &self.units {
            if !units.contains(&element.owner()) {
                return false;
            }
        }
        if let Some(types) = &self.element_types {
            if !types.contains(&element.element_type()) {
                return false;
            }
        }
        if let Some(domain) = &self.domain {
            let Some(association) = element.association(domain) else {
                return false;
            };
            if self.sub_type.as_ref().is_some_and(|s| s != &association.sub_type) {
                return false;
            }
            if self.status.as_ref().is_some_and(|s| s != &association.status) {
                return false;
            }
        } else if self.sub_type.is_some() || self.status.is_some() {
            let any = element.domains().values().any(|a| {
                self.sub_type.as_ref().map_or(true, |s| s == &a.sub_type)
                    && self.status.as_ref().map_or(true, |s| s == &a.status)
            });
            if !any {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&element.id()) {
                return false;
            }
        }
        if let Some(has_children) = self.has_child_elements {
            let children = !element.parts().is_empty() || !element.members().is_empty();
            if children != has_children {
                return false;
            }
        }
        contains(&element.display_name(), &self.display_name)
            && contains(element.name(), &self.name)
            && contains(element.abbreviation().unwrap_or_default(), &self.abbreviation)
            && contains(element.description().unwrap_or_default(), &self.description)
            && contains(element.designator(), &self.designator)
            && contains(element.updated_by(), &self.updated_by)
    }

    /// Filters, sorts, and pages `candidates`.
    ///
    /// `candidates` must hold every element of the client so that parent
    /// and scope membership can be resolved.
    pub fn run(&self, candidates: Vec<Element>, page: &PageRequest) -> PagedResult<Element> {
        let children: BTreeSet<ElementId> = candidates
            .iter()
            .flat_map(|e| e.parts().iter().chain(e.members().iter()).copied())
            .collect();
        let scope_members: Option<BTreeSet<ElementId>> = self.scope.map(|scope| {
            candidates
                .iter()
                .find(|e| e.id() == scope)
                .map(|s| s.members().clone())
                .unwrap_or_default()
        });

        let mut found: Vec<Element> = candidates
            .into_iter()
            .filter(|e| self.matches(e))
            .filter(|e| {
                self.has_parent_elements
                    .map_or(true, |wanted| children.contains(&e.id()) == wanted)
            })
            .filter(|e| scope_members.as_ref().map_or(true, |m| m.contains(&e.id())))
            .collect();
        page.order(&mut found);
        page.apply(found)
    }
}

/// Repository port for Element aggregate persistence.
#[async_trait]
pub trait ElementRepository: Send + Sync {
    /// Save a new element.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    async fn save(&self, element: &Element) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the element doesn't exist
    async fn update(&self, element: &Element) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ElementId) -> Result<Option<Element>, DomainError>;

    /// Elements with the given ids. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &BTreeSet<ElementId>) -> Result<Vec<Element>, DomainError>;

    async fn find_by_unit(&self, unit_id: &UnitId) -> Result<Vec<Element>, DomainError>;

    /// Elements of a client associated with `domain`.
    async fn find_by_domain(
        &self,
        client_id: &ClientId,
        domain: &DomainId,
    ) -> Result<Vec<Element>, DomainError>;

    async fn query(
        &self,
        query: &ElementQuery,
        page: PageRequest,
    ) -> Result<PagedResult<Element>, DomainError>;

    /// Elements that link to, contain, or carry a risk or control
    /// implementation referring to `target`.
    async fn find_referencing(&self, target: &ElementId) -> Result<Vec<Element>, DomainError>;

    /// Elements listing `part` among their parts or members.
    async fn find_composites_of(&self, part: &ElementId) -> Result<Vec<Element>, DomainError>;

    /// Next free designator number for a type within a client.
    async fn next_designator(
        &self,
        client_id: &ClientId,
        element_type: ElementType,
    ) -> Result<u64, DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the element doesn't exist
    async fn delete(&self, id: &ElementId) -> Result<(), DomainError>;
}
