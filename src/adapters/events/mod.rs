//! Event adapters.
//!
//! - `InMemoryEventBus` - synchronous in-process bus for tests
//! - `OutboxEventPublisher` - writes events to the transactional outbox
//! - `OutboxPublisher` - background delivery of outbox entries
//! - `RedisEventPublisher` - broker side, publishes to redis pub/sub
//! - `ClientChangeSubscriber` - consumes client lifecycle messages

mod client_change_subscriber;
mod in_memory;
mod outbox_event_publisher;
mod outbox_publisher;
mod redis_publisher;

pub use client_change_subscriber::{ClientChangeSubscriber, Dispatch};
pub use in_memory::InMemoryEventBus;
pub use outbox_event_publisher::OutboxEventPublisher;
pub use outbox_publisher::{OutboxPublisher, OutboxPublisherConfig};
pub use redis_publisher::RedisEventPublisher;
