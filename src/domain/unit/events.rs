//! Unit domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, EventId, Timestamp, UnitId};
use crate::domain_event;

// ════════════════════════════════════════════════════════════════════════════
// UnitCreated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCreated {
    pub event_id: EventId,
    pub unit_id: UnitId,
    pub client_id: ClientId,
    pub name: String,
    pub parent_id: Option<UnitId>,
    pub created_at: Timestamp,
}

domain_event!(
    UnitCreated,
    event_type = "unit.created.v1",
    schema_version = 1,
    aggregate_id = unit_id,
    aggregate_type = "Unit",
    occurred_at = created_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// UnitUpdated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitUpdated {
    pub event_id: EventId,
    pub unit_id: UnitId,
    pub client_id: ClientId,
    pub version: i64,
    pub updated_at: Timestamp,
}

domain_event!(
    UnitUpdated,
    event_type = "unit.updated.v1",
    schema_version = 1,
    aggregate_id = unit_id,
    aggregate_type = "Unit",
    occurred_at = updated_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// UnitDeleted
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDeleted {
    pub event_id: EventId,
    pub unit_id: UnitId,
    pub client_id: ClientId,
    /// Elements removed together with the unit.
    pub deleted_elements: usize,
    pub deleted_at: Timestamp,
}

domain_event!(
    UnitDeleted,
    event_type = "unit.deleted.v1",
    schema_version = 1,
    aggregate_id = unit_id,
    aggregate_type = "Unit",
    occurred_at = deleted_at,
    event_id = event_id
);
