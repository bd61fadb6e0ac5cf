use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{OutboxEntry, OutboxStatus, OutboxWriter};

use super::not_found;

/// Outbox kept in a vector, in insertion order.
#[derive(Default)]
pub struct InMemoryOutboxWriter {
    entries: RwLock<Vec<OutboxEntry>>,
}

impl InMemoryOutboxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<OutboxEntry> {
        self.entries.read().await.clone()
    }

    async fn modify(&self, id: Uuid, f: impl FnOnce(&mut OutboxEntry)) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Outbox entry", id))?;
        f(entry);
        Ok(())
    }
}

#[async_trait]
impl OutboxWriter for InMemoryOutboxWriter {
    async fn write(
        &self,
        event: &EventEnvelope,
        partition_key: &str,
    ) -> Result<OutboxEntry, DomainError> {
        let entry = OutboxEntry::new(event.clone(), partition_key);
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn write_batch(
        &self,
        events: &[EventEnvelope],
        partition_key: &str,
    ) -> Result<Vec<OutboxEntry>, DomainError> {
        let written: Vec<OutboxEntry> = events
            .iter()
            .map(|e| OutboxEntry::new(e.clone(), partition_key))
            .collect();
        self.entries.write().await.extend(written.iter().cloned());
        Ok(written)
    }

    async fn get_pending(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.is_deliverable())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), DomainError> {
        self.modify(id, OutboxEntry::mark_published).await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        self.modify(id, |e| e.mark_failed(error)).await
    }

    async fn cleanup_old(&self, older_than_hours: u32) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - Duration::hours(older_than_hours as i64);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| {
            !(e.status == OutboxStatus::Published && e.processed_at.is_some_and(|at| at <= cutoff))
        });
        Ok((before - entries.len()) as u64)
    }
}
