//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - OIDC token validation and a mock validator
//! - `events` - In-memory bus, transactional outbox, redis pub/sub
//! - `http` - REST API on axum
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories on sqlx
//! - `validation` - JSON schema validation of element payloads

pub mod auth;
pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod validation;

pub use events::{InMemoryEventBus, OutboxPublisher, OutboxPublisherConfig};
