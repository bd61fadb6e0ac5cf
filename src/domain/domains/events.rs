//! Domain (methodology) events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, DomainId, EventId, Timestamp};
use crate::domain_event;

// ════════════════════════════════════════════════════════════════════════════
// DomainMigrated
// ════════════════════════════════════════════════════════════════════════════

/// Published when all elements of a client moved to a new domain version
/// and the old domain was deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMigrated {
    pub event_id: EventId,
    /// Domain that replaced the old one.
    pub domain_id: DomainId,
    pub old_domain_id: DomainId,
    pub client_id: ClientId,
    pub migrated_elements: usize,
    pub migrated_at: Timestamp,
}

domain_event!(
    DomainMigrated,
    event_type = "domain.migrated.v1",
    schema_version = 1,
    aggregate_id = domain_id,
    aggregate_type = "Domain",
    occurred_at = migrated_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// DomainCreated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCreated {
    pub event_id: EventId,
    pub domain_id: DomainId,
    pub client_id: ClientId,
    pub name: String,
    pub created_at: Timestamp,
}

domain_event!(
    DomainCreated,
    event_type = "domain.created.v1",
    schema_version = 1,
    aggregate_id = domain_id,
    aggregate_type = "Domain",
    occurred_at = created_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// DomainContentUpdated
// ════════════════════════════════════════════════════════════════════════════

/// Published when a definition, decision, inspection, or risk definition
/// of a domain was saved or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainContentUpdated {
    pub event_id: EventId,
    pub domain_id: DomainId,
    pub client_id: ClientId,
    /// What changed, e.g. `decision:piaMandatory`.
    pub content: String,
    pub removed: bool,
    pub updated_at: Timestamp,
}

domain_event!(
    DomainContentUpdated,
    event_type = "domain.content_updated.v1",
    schema_version = 1,
    aggregate_id = domain_id,
    aggregate_type = "Domain",
    occurred_at = updated_at,
    event_id = event_id
);
