//! PostgreSQL adapters - sqlx implementations of the repository ports.
//!
//! - `PostgresClientRepository`, `PostgresUnitRepository` - plain columns
//! - `PostgresDomainRepository`, `PostgresElementRepository` - JSONB
//!   documents plus the columns needed for lookups
//! - `PostgresOutboxWriter` - the `event_outbox` table
//! - `PostgresTransactionManager` - units of work over one transaction
//!
//! Updates are guarded by the version column: a row is only written when
//! it is still at the version the aggregate was loaded with.

mod client_repository;
mod domain_repository;
mod element_repository;
mod outbox_writer;
mod session;
mod unit_repository;

pub use client_repository::PostgresClientRepository;
pub use domain_repository::PostgresDomainRepository;
pub use element_repository::PostgresElementRepository;
pub use outbox_writer::PostgresOutboxWriter;
pub use session::{PgSession, PostgresTransactionManager};
pub use unit_repository::PostgresUnitRepository;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a sqlx failure, turning unique violations into `AlreadyExists`.
fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        let unique_violation = e
            .as_database_error()
            .and_then(|d| d.code())
            .is_some_and(|code| code == "23505");
        if unique_violation {
            DomainError::new(ErrorCode::AlreadyExists, format!("Failed to {}: duplicate key", action))
        } else {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
        }
    }
}

fn not_found(entity: &str, id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(ErrorCode::NotFound, format!("{} {} not found", entity, id)).with_detail("id", id)
}

fn corrupt(entity: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Corrupt {} row: {}", entity, e))
}

/// Explains an update that matched no row: either the row is gone or it
/// moved past the version the aggregate was loaded with.
async fn missed_update(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &str,
    id: Uuid,
    written: i64,
) -> DomainError {
    let stored: Result<Option<(i64,)>, _> =
        sqlx::query_as(&format!("SELECT version FROM {} WHERE id = $1", table))
            .bind(id)
            .fetch_optional(conn)
            .await;
    match stored {
        Ok(None) => not_found(entity, id),
        Ok(Some((stored,))) => DomainError::new(
            ErrorCode::ETagMismatch,
            format!("{} {} is at version {}, cannot write version {}", entity, id, stored, written),
        )
        .with_detail("id", id.to_string()),
        Err(e) => db_error("check version")(e),
    }
}
