//! Client domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, EventId, Timestamp};
use crate::domain_event;

use super::ClientState;

// ════════════════════════════════════════════════════════════════════════════
// ClientStateChanged
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStateChanged {
    pub event_id: EventId,
    pub client_id: ClientId,
    pub state: ClientState,
    pub changed_at: Timestamp,
}

domain_event!(
    ClientStateChanged,
    event_type = "client.state_changed.v1",
    schema_version = 1,
    aggregate_id = client_id,
    aggregate_type = "Client",
    occurred_at = changed_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// ClientDeleted
// ════════════════════════════════════════════════════════════════════════════

/// Published after a client and all of its units, elements, and domains
/// were removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDeleted {
    pub event_id: EventId,
    pub client_id: ClientId,
    pub deleted_units: usize,
    pub deleted_at: Timestamp,
}

domain_event!(
    ClientDeleted,
    event_type = "client.deleted.v1",
    schema_version = 1,
    aggregate_id = client_id,
    aggregate_type = "Client",
    occurred_at = deleted_at,
    event_id = event_id
);
