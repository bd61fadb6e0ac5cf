//! Unit aggregate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ClientId, ClientOwned, DomainError, DomainId, OwningUnit, Timestamp, UnitId, ValidationError,
};

/// Maximum length for unit names.
pub const MAX_UNIT_NAME_LENGTH: usize = 255;

/// Organizational container for elements. Units may be nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    client_id: ClientId,
    name: String,
    abbreviation: Option<String>,
    description: Option<String>,
    parent_id: Option<UnitId>,
    domains: BTreeSet<DomainId>,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Unit {
    /// # Errors
    ///
    /// - `ValidationFailed` if the name is empty or too long
    pub fn new(id: UnitId, client_id: ClientId, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = validate_name(name.into())?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            client_id,
            name,
            abbreviation: None,
            description: None,
            parent_id: None,
            domains: BTreeSet::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: UnitId,
        client_id: ClientId,
        name: String,
        abbreviation: Option<String>,
        description: Option<String>,
        parent_id: Option<UnitId>,
        domains: BTreeSet<DomainId>,
        version: i64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            client_id,
            name,
            abbreviation,
            description,
            parent_id,
            domains,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent_id(&self) -> Option<UnitId> {
        self.parent_id
    }

    pub fn domains(&self) -> &BTreeSet<DomainId> {
        &self.domains
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.name = validate_name(name.into())?;
        Ok(())
    }

    pub fn set_abbreviation(&mut self, abbreviation: Option<String>) {
        self.abbreviation = abbreviation.filter(|a| !a.trim().is_empty());
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
    }

    /// # Errors
    ///
    /// - `ValidationFailed` if the unit would be its own parent
    pub fn set_parent(&mut self, parent: Option<UnitId>) -> Result<(), DomainError> {
        if parent == Some(self.id) {
            return Err(DomainError::validation("parent", "A unit cannot be its own parent"));
        }
        self.parent_id = parent;
        Ok(())
    }

    pub fn set_domains(&mut self, domains: BTreeSet<DomainId>) {
        self.domains = domains;
    }

    pub fn remove_domain(&mut self, domain: &DomainId) -> bool {
        self.domains.remove(domain)
    }

    pub fn add_domain(&mut self, domain: DomainId) -> bool {
        self.domains.insert(domain)
    }

    /// Records a modification, bumping the version.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Timestamp::now();
    }
}

fn validate_name(name: String) -> Result<String, DomainError> {
    if name.trim().is_empty() {
        return Err(ValidationError::empty_field("name").into());
    }
    let length = name.chars().count();
    if length > MAX_UNIT_NAME_LENGTH {
        return Err(ValidationError::too_long("name", MAX_UNIT_NAME_LENGTH, length).into());
    }
    Ok(name)
}

impl ClientOwned for Unit {
    fn owning_client(&self) -> Option<ClientId> {
        Some(self.client_id)
    }

    fn resource_id(&self) -> String {
        self.id.to_string()
    }
}

impl OwningUnit for Unit {
    fn unit_id(&self) -> UnitId {
        self.id
    }

    fn unit_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(UnitId::new(), ClientId::new(), "Headquarters").unwrap()
    }

    #[test]
    fn name_is_validated() {
        assert!(Unit::new(UnitId::new(), ClientId::new(), "").is_err());
        let long = "u".repeat(MAX_UNIT_NAME_LENGTH + 1);
        let err = Unit::new(UnitId::new(), ClientId::new(), long).unwrap_err();
        assert_eq!(err.details.get("field").map(String::as_str), Some("name"));
    }

    #[test]
    fn cannot_be_own_parent() {
        let mut u = unit();
        let own = u.id();
        assert!(u.set_parent(Some(own)).is_err());
        assert!(u.set_parent(Some(UnitId::new())).is_ok());
    }

    #[test]
    fn blank_abbreviation_is_cleared() {
        let mut u = unit();
        u.set_abbreviation(Some("  ".into()));
        assert_eq!(u.abbreviation(), None);
        u.set_abbreviation(Some("HQ".into()));
        assert_eq!(u.abbreviation(), Some("HQ"));
    }

    #[test]
    fn touch_increments_version() {
        let mut u = unit();
        u.touch();
        u.touch();
        assert_eq!(u.version(), 2);
    }
}
