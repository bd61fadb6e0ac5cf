//! OutboxWriter port - transactional outbox for domain events.
//!
//! Events are first stored as outbox rows and only then pushed to the
//! message broker by the `OutboxPublisher` background task, so a crash
//! between the database change and the broker call never loses an event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Delivery state of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Published,
    /// Last attempt failed; the row is retried until `MAX_ATTEMPTS`.
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Published => "published",
            OutboxStatus::Failed => "failed",
        }
    }
}

/// A stored event waiting for (or done with) delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub event: EventEnvelope,
    pub status: OutboxStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Client id of the event, keeps per-client ordering possible.
    pub partition_key: String,
}

impl OutboxEntry {
    /// Entries failing this often are no longer picked up.
    pub const MAX_ATTEMPTS: u32 = 10;

    pub fn new(event: EventEnvelope, partition_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            status: OutboxStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            attempts: 0,
            last_error: None,
            partition_key: partition_key.into(),
        }
    }

    /// Partition key for an envelope: its client, or the aggregate id for
    /// client-less events.
    pub fn partition_key_of(event: &EventEnvelope) -> String {
        event
            .metadata
            .client_id
            .clone()
            .unwrap_or_else(|| event.aggregate_id.clone())
    }

    pub fn mark_published(&mut self) {
        self.status = OutboxStatus::Published;
        self.processed_at = Some(Utc::now());
        self.attempts += 1;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Failed;
        self.processed_at = Some(Utc::now());
        self.attempts += 1;
        self.last_error = Some(error.into());
    }

    /// Pending rows and failed rows with attempts left.
    pub fn is_deliverable(&self) -> bool {
        match self.status {
            OutboxStatus::Pending => true,
            OutboxStatus::Failed => self.attempts < Self::MAX_ATTEMPTS,
            OutboxStatus::Published => false,
        }
    }
}

/// Port for the outbox table.
#[async_trait]
pub trait OutboxWriter: Send + Sync {
    async fn write(
        &self,
        event: &EventEnvelope,
        partition_key: &str,
    ) -> Result<OutboxEntry, DomainError>;

    /// Writes all events or none.
    async fn write_batch(
        &self,
        events: &[EventEnvelope],
        partition_key: &str,
    ) -> Result<Vec<OutboxEntry>, DomainError>;

    /// Deliverable entries, oldest first.
    async fn get_pending(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError>;

    async fn mark_published(&self, id: Uuid) -> Result<(), DomainError>;

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError>;

    /// Deletes entries published more than `older_than_hours` ago.
    /// Returns the number of deleted rows.
    async fn cleanup_old(&self, older_than_hours: u32) -> Result<u64, DomainError>;
}
