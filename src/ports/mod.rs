//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Repository Ports
//!
//! - `ClientRepository`, `UnitRepository`, `DomainRepository`
//! - `ElementRepository` - elements of all types plus paged queries
//!
//! ## Event Ports
//!
//! - `EventPublisher` - hands events to the outbox or a broker
//! - `OutboxWriter` - transactional event persistence for guaranteed delivery
//!
//! ## Transactions
//!
//! - `TransactionManager` / `UnitOfWork` - repositories sharing one commit
//!
//! ## Other
//!
//! - `SessionValidator` - bearer token validation
//! - `ElementSchemaValidator` - JSON schema checks of element payloads

mod client_repository;
mod domain_repository;
mod element_repository;
mod event_publisher;
mod outbox_writer;
mod schema_validator;
mod session_validator;
mod unit_of_work;
mod unit_repository;

pub use client_repository::ClientRepository;
pub use domain_repository::DomainRepository;
pub use element_repository::{
    ElementQuery, ElementRepository, PageRequest, PagedResult, SortColumn, SortDirection,
};
pub use event_publisher::EventPublisher;
pub use outbox_writer::{OutboxEntry, OutboxStatus, OutboxWriter};
pub use schema_validator::{ElementSchemaValidator, SchemaError, SchemaViolation};
pub use session_validator::SessionValidator;
pub use unit_of_work::{Repositories, TransactionManager, UnitOfWork};
pub use unit_repository::UnitRepository;
