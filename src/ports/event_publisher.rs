//! EventPublisher port - Interface for publishing domain events.
//!
//! Use cases hand envelopes to this port. Production wiring writes them to
//! the outbox so they are delivered after the change is stored; tests use
//! the in-memory bus.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Delivery is at-least-once; subscribers must tolerate duplicates.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events, in order.
    ///
    /// Adapters that cannot publish atomically stop at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl EventPublisher for Recording {
        async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
            self.0.lock().unwrap().push(event.event_type);
            Ok(())
        }
    }

    #[test]
    fn event_publisher_is_object_safe() {
        fn _accepts_dyn(_publisher: &dyn EventPublisher) {}
    }

    #[tokio::test]
    async fn publish_all_defaults_to_sequential_publish() {
        let publisher = Recording(Mutex::new(Vec::new()));
        let mut second = EventEnvelope::test_fixture();
        second.event_type = "unit.deleted.v1".into();

        publisher
            .publish_all(vec![EventEnvelope::test_fixture(), second])
            .await
            .unwrap();

        assert_eq!(
            *publisher.0.lock().unwrap(),
            vec!["test.event.v1".to_string(), "unit.deleted.v1".to_string()]
        );
    }
}
