//! Background delivery of outbox entries.
//!
//! Handlers only write events to the outbox. This task picks pending
//! entries up, hands them to the broker publisher, and records the
//! outcome. It also prunes published rows once they are older than the
//! retention window.
//!
//! | Setting | Default |
//! |---------|---------|
//! | `poll_interval` | 100ms |
//! | `batch_size` | 100 |
//! | `cleanup_interval` | 1h |
//! | `retention_hours` | 24 |
//!
//! On shutdown the current batch is finished before the loop exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::foundation::DomainError;
use crate::ports::{EventPublisher, OutboxWriter};

#[derive(Debug, Clone)]
pub struct OutboxPublisherConfig {
    pub poll_interval: Duration,
    pub batch_size: u32,
    pub cleanup_interval: Duration,
    /// Published rows older than this are deleted.
    pub retention_hours: u32,
}

impl Default for OutboxPublisherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            batch_size: 100,
            cleanup_interval: Duration::from_secs(3600),
            retention_hours: 24,
        }
    }
}

impl OutboxPublisherConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_cleanup(mut self, interval: Duration, retention_hours: u32) -> Self {
        self.cleanup_interval = interval;
        self.retention_hours = retention_hours;
        self
    }
}

/// Moves events from the outbox to the broker.
pub struct OutboxPublisher {
    outbox: Arc<dyn OutboxWriter>,
    event_publisher: Arc<dyn EventPublisher>,
    config: OutboxPublisherConfig,
}

impl OutboxPublisher {
    pub fn new(outbox: Arc<dyn OutboxWriter>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_config(outbox, event_publisher, OutboxPublisherConfig::default())
    }

    pub fn with_config(
        outbox: Arc<dyn OutboxWriter>,
        event_publisher: Arc<dyn EventPublisher>,
        config: OutboxPublisherConfig,
    ) -> Self {
        Self {
            outbox,
            event_publisher,
            config,
        }
    }

    /// Polls until `shutdown` turns true.
    ///
    /// Failing polls are logged and retried on the next tick; only the
    /// final batch after the shutdown signal propagates its error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut poll = time::interval(self.config.poll_interval);
        let mut cleanup = time::interval(self.config.cleanup_interval);
        info!(
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Outbox publisher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.process_batch().await?;
                        info!("Outbox publisher stopped");
                        return Ok(());
                    }
                }
                _ = poll.tick() => {
                    if let Err(e) = self.process_batch().await {
                        warn!(error = %e, "Outbox poll failed");
                    }
                }
                _ = cleanup.tick() => {
                    if let Err(e) = self.cleanup().await {
                        warn!(error = %e, "Outbox cleanup failed");
                    }
                }
            }
        }
    }

    /// Publishes one batch of deliverable entries and returns how many
    /// went out.
    pub async fn process_batch(&self) -> Result<usize, DomainError> {
        let entries = self.outbox.get_pending(self.config.batch_size).await?;
        let mut published = 0;

        for entry in entries {
            match self.event_publisher.publish(entry.event.clone()).await {
                Ok(()) => {
                    self.outbox.mark_published(entry.id).await?;
                    published += 1;
                }
                Err(e) => {
                    warn!(
                        event_id = %entry.event.event_id,
                        event_type = %entry.event.event_type,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "Failed to publish event"
                    );
                    self.outbox.mark_failed(entry.id, &e.to_string()).await?;
                }
            }
        }

        if published > 0 {
            debug!(published, "Published outbox batch");
        }
        Ok(published)
    }

    /// Deletes published entries past the retention window.
    pub async fn cleanup(&self) -> Result<u64, DomainError> {
        let deleted = self.outbox.cleanup_old(self.config.retention_hours).await?;
        if deleted > 0 {
            info!(deleted, retention_hours = self.config.retention_hours, "Deleted published outbox entries");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryOutboxWriter;
    use crate::adapters::InMemoryEventBus;
    use crate::domain::foundation::{ErrorCode, EventEnvelope};
    use crate::ports::OutboxStatus;

    async fn outbox_with(count: usize) -> Arc<InMemoryOutboxWriter> {
        let outbox = Arc::new(InMemoryOutboxWriter::new());
        for _ in 0..count {
            outbox.write(&EventEnvelope::test_fixture(), "p").await.unwrap();
        }
        outbox
    }

    struct FailingPublisher;

    #[async_trait::async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::CacheError, "broker down"))
        }
    }

    #[tokio::test]
    async fn process_batch_publishes_pending_events() {
        let outbox = outbox_with(2).await;
        let bus = Arc::new(InMemoryEventBus::new());

        let count = OutboxPublisher::new(outbox.clone(), bus.clone())
            .process_batch()
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(bus.event_count(), 2);
        assert!(outbox
            .entries()
            .await
            .iter()
            .all(|e| e.status == OutboxStatus::Published));
    }

    #[tokio::test]
    async fn process_batch_respects_batch_size() {
        let outbox = outbox_with(5).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let config = OutboxPublisherConfig::default().with_batch_size(2);
        let publisher = OutboxPublisher::with_config(outbox, bus, config);

        assert_eq!(publisher.process_batch().await.unwrap(), 2);
        assert_eq!(publisher.process_batch().await.unwrap(), 2);
        assert_eq!(publisher.process_batch().await.unwrap(), 1);
        assert_eq!(publisher.process_batch().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_publish_marks_entry_failed() {
        let outbox = outbox_with(1).await;

        let count = OutboxPublisher::new(outbox.clone(), Arc::new(FailingPublisher))
            .process_batch()
            .await
            .unwrap();

        assert_eq!(count, 0);
        let entries = outbox.entries().await;
        assert_eq!(entries[0].status, OutboxStatus::Failed);
        assert_eq!(entries[0].attempts, 1);
        assert!(entries[0].last_error.as_deref().unwrap().contains("broker down"));
    }

    #[tokio::test]
    async fn cleanup_removes_published_entries() {
        let outbox = outbox_with(1).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let config = OutboxPublisherConfig::default().with_cleanup(Duration::from_secs(60), 0);
        let publisher = OutboxPublisher::with_config(outbox.clone(), bus, config);

        publisher.process_batch().await.unwrap();
        let deleted = publisher.cleanup().await.unwrap();

        assert_eq!(deleted, 1);
        assert!(outbox.entries().await.is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let outbox = outbox_with(1).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let config = OutboxPublisherConfig::default().with_poll_interval(Duration::from_millis(10));
        let publisher = OutboxPublisher::with_config(outbox, bus.clone(), config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { publisher.run(shutdown_rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        assert!(handle.await.unwrap().is_ok());
        assert_eq!(bus.event_count(), 1);
    }
}
