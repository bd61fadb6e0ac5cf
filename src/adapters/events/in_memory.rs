//! In-memory event bus.
//!
//! Records every envelope in publication order, so tests can assert on
//! what a use case published.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

/// In-process event bus.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// handler.handle(cmd, metadata).await?;
/// assert!(bus.has_event("element.created.v1"));
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    published: Mutex<Vec<EventEnvelope>>,
}

/// Recorded data stays usable after a panicking test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        lock(&self.published).clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        lock(&self.published)
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Event types in publication order.
    pub fn event_types(&self) -> Vec<String> {
        lock(&self.published)
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        lock(&self.published).iter().any(|e| e.event_type == event_type)
    }

    pub fn event_count(&self) -> usize {
        lock(&self.published).len()
    }

    pub fn clear(&self) {
        lock(&self.published).clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        lock(&self.published).push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(event_type: &str) -> EventEnvelope {
        let mut e = EventEnvelope::test_fixture();
        e.event_type = event_type.to_string();
        e
    }

    #[tokio::test]
    async fn records_published_events_in_order() {
        let bus = InMemoryEventBus::new();

        bus.publish(envelope("element.created.v1")).await.unwrap();
        bus.publish(envelope("element.deleted.v1")).await.unwrap();

        assert_eq!(bus.event_types(), vec!["element.created.v1", "element.deleted.v1"]);
        assert_eq!(bus.events_of_type("element.deleted.v1").len(), 1);

        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }
}
