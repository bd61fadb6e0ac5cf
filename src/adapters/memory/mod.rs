//! In-memory repository adapters.
//!
//! Used by tests and the local development profile. Data lives for the
//! lifetime of the process only.

mod client_repository;
mod domain_repository;
mod element_repository;
mod outbox_writer;
mod transactions;
mod unit_repository;

pub use client_repository::InMemoryClientRepository;
pub use domain_repository::InMemoryDomainRepository;
pub use element_repository::InMemoryElementRepository;
pub use outbox_writer::InMemoryOutboxWriter;
pub use transactions::InMemoryTransactionManager;
pub use unit_repository::InMemoryUnitRepository;

use crate::domain::foundation::{DomainError, ErrorCode};

fn not_found(entity: &str, id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(ErrorCode::NotFound, format!("{} {} not found", entity, id)).with_detail("id", id)
}

fn already_exists(entity: &str, id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(ErrorCode::AlreadyExists, format!("{} {} already exists", entity, id))
        .with_detail("id", id)
}

/// Update whose aggregate was not derived from the stored version.
fn stale(entity: &str, id: impl ToString, stored: i64, written: i64) -> DomainError {
    let id = id.to_string();
    DomainError::new(
        ErrorCode::ETagMismatch,
        format!("{} {} is at version {}, cannot write version {}", entity, id, stored, written),
    )
    .with_detail("id", id)
}
