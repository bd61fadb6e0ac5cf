//! HTTP DTOs for unit endpoints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainId, Timestamp, UnitId};
use crate::domain::unit::Unit;

/// Body of `POST /units` and `PUT /units/:id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRequest {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Only read on creation.
    #[serde(default)]
    pub parent: Option<UnitId>,
    #[serde(default)]
    pub domains: BTreeSet<DomainId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUnitsParams {
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResponse {
    pub id: UnitId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<UnitId>,
    pub domains: BTreeSet<DomainId>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Unit> for UnitResponse {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            name: unit.name().to_string(),
            abbreviation: unit.abbreviation().map(str::to_owned),
            description: unit.description().map(str::to_owned),
            parent: unit.parent_id(),
            domains: unit.domains().clone(),
            version: unit.version(),
            created_at: *unit.created_at(),
            updated_at: *unit.updated_at(),
        }
    }
}

/// Result of a unit deletion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUnitResponse {
    pub deleted_units: usize,
    pub deleted_elements: usize,
}
