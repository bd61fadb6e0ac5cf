//! Redis pub/sub publisher.
//!
//! Each envelope is serialized to JSON and published on
//! `<prefix>.<aggregate type>`, e.g. `veo.element` for element events.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
    channel_prefix: String,
}

impl RedisEventPublisher {
    pub fn new(conn: MultiplexedConnection, channel_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            channel_prefix: channel_prefix.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let channel = event.routing_key(&self.channel_prefix);
        let payload = serde_json::to_string(&event).map_err(|e| {
            DomainError::new(ErrorCode::InternalError, format!("Cannot serialize event: {}", e))
        })?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&channel, payload)
            .await
            .map_err(|e: redis::RedisError| DomainError::new(ErrorCode::CacheError, e.to_string()))?;

        debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            channel = %channel,
            receivers,
            "Published event"
        );
        Ok(())
    }
}
