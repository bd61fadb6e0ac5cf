//! Element domain events.
//!
//! - `ElementCreated`, `ElementUpdated`, `ElementDeleted` - lifecycle
//! - `RiskAffectingElementChanged` - a change that may alter computed risks
//! - `RiskAffectedLinkDeleted` - a link from a risk-affected element vanished

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, ElementId, ElementType, EventId, Timestamp, UnitId};
use crate::domain_event;

// ════════════════════════════════════════════════════════════════════════════
// ElementCreated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementCreated {
    pub event_id: EventId,
    pub element_id: ElementId,
    pub element_type: ElementType,
    pub owner: UnitId,
    pub client_id: ClientId,
    pub designator: String,
    pub created_at: Timestamp,
}

domain_event!(
    ElementCreated,
    event_type = "element.created.v1",
    schema_version = 1,
    aggregate_id = element_id,
    aggregate_type = "Element",
    occurred_at = created_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// ElementUpdated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementUpdated {
    pub event_id: EventId,
    pub element_id: ElementId,
    pub element_type: ElementType,
    pub client_id: ClientId,
    /// Version after the update.
    pub version: i64,
    pub updated_at: Timestamp,
}

domain_event!(
    ElementUpdated,
    event_type = "element.updated.v1",
    schema_version = 1,
    aggregate_id = element_id,
    aggregate_type = "Element",
    occurred_at = updated_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// ElementDeleted
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDeleted {
    pub event_id: EventId,
    pub element_id: ElementId,
    pub element_type: ElementType,
    pub owner: UnitId,
    pub client_id: ClientId,
    pub deleted_at: Timestamp,
}

domain_event!(
    ElementDeleted,
    event_type = "element.deleted.v1",
    schema_version = 1,
    aggregate_id = element_id,
    aggregate_type = "Element",
    occurred_at = deleted_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// RiskAffectingElementChanged
// ════════════════════════════════════════════════════════════════════════════

/// Why risk values may need to be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskChange {
    ElementModified,
    ElementDeleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAffectingElementChanged {
    pub event_id: EventId,
    pub element_id: ElementId,
    pub element_type: ElementType,
    pub client_id: ClientId,
    pub change: RiskChange,
    pub changed_at: Timestamp,
}

domain_event!(
    RiskAffectingElementChanged,
    event_type = "risk_affecting_element.changed.v1",
    schema_version = 1,
    aggregate_id = element_id,
    aggregate_type = "Element",
    occurred_at = changed_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// RiskAffectedLinkDeleted
// ════════════════════════════════════════════════════════════════════════════

/// Sent to the target of a link whose (risk-affected) source was deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAffectedLinkDeleted {
    pub event_id: EventId,
    /// Element that was linked to.
    pub target_id: ElementId,
    /// Deleted element the link started from.
    pub source_id: ElementId,
    pub source_type: ElementType,
    pub client_id: ClientId,
    pub deleted_at: Timestamp,
}

domain_event!(
    RiskAffectedLinkDeleted,
    event_type = "risk_affected.link_deleted.v1",
    schema_version = 1,
    aggregate_id = target_id,
    aggregate_type = "Element",
    occurred_at = deleted_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SerializableDomainEvent;

    #[test]
    fn link_deleted_is_addressed_to_target() {
        let target = ElementId::new();
        let event = RiskAffectedLinkDeleted {
            event_id: EventId::new(),
            target_id: target,
            source_id: ElementId::new(),
            source_type: ElementType::Process,
            client_id: ClientId::new(),
            deleted_at: Timestamp::now(),
        };

        let envelope = event.to_envelope();

        assert_eq!(envelope.aggregate_id, target.to_string());
        assert_eq!(envelope.event_type, "risk_affected.link_deleted.v1");
        assert_eq!(envelope.payload["source_type"], "process");
    }

    #[test]
    fn risk_change_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&RiskChange::ElementDeleted).unwrap(),
            "\"ELEMENT_DELETED\""
        );
    }
}
