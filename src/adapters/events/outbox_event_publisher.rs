//! `EventPublisher` that writes to the outbox instead of the broker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventPublisher, OutboxEntry, OutboxWriter};

/// Stores events for later delivery by the `OutboxPublisher`.
pub struct OutboxEventPublisher {
    outbox: Arc<dyn OutboxWriter>,
}

impl OutboxEventPublisher {
    pub fn new(outbox: Arc<dyn OutboxWriter>) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl EventPublisher for OutboxEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let partition_key = OutboxEntry::partition_key_of(&event);
        self.outbox.write(&event, &partition_key).await?;
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        let Some(first) = events.first() else {
            return Ok(());
        };
        let partition_key = OutboxEntry::partition_key_of(first);
        self.outbox.write_batch(&events, &partition_key).await?;
        Ok(())
    }
}
