//! PostgreSQL implementation of OutboxWriter (`event_outbox` table).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{OutboxEntry, OutboxStatus, OutboxWriter};

use super::{corrupt, db_error, not_found, PgSession};

/// Outbox rows written through a transactional session commit with the
/// use case that produced them.
#[derive(Clone)]
pub struct PostgresOutboxWriter {
    session: PgSession,
}

impl PostgresOutboxWriter {
    pub fn new(pool: PgPool) -> Self {
        Self::with_session(PgSession::pooled(pool))
    }

    pub fn with_session(session: PgSession) -> Self {
        Self { session }
    }
}

fn parse_status(raw: &str) -> Result<OutboxStatus, DomainError> {
    match raw {
        "pending" => Ok(OutboxStatus::Pending),
        "published" => Ok(OutboxStatus::Published),
        "failed" => Ok(OutboxStatus::Failed),
        other => Err(corrupt("outbox", format!("unknown status '{}'", other))),
    }
}

fn row_to_entry(row: PgRow) -> Result<OutboxEntry, DomainError> {
    let read = |e: sqlx::Error| corrupt("outbox", e);
    let status: String = row.try_get("status").map_err(read)?;
    let Json(event): Json<EventEnvelope> = row.try_get("payload").map_err(read)?;
    let attempts: i32 = row.try_get("attempts").map_err(read)?;
    Ok(OutboxEntry {
        id: row.try_get("id").map_err(read)?,
        event,
        status: parse_status(&status)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(read)?,
        processed_at: row.try_get("processed_at").map_err(read)?,
        attempts: attempts.max(0) as u32,
        last_error: row.try_get("last_error").map_err(read)?,
        partition_key: row.try_get("partition_key").map_err(read)?,
    })
}

async fn insert<'e, E>(executor: E, entry: &OutboxEntry) -> Result<(), DomainError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO event_outbox (id, event_id, event_type, payload, status, partition_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id)
    .bind(entry.event.event_id.to_string())
    .bind(&entry.event.event_type)
    .bind(Json(&entry.event))
    .bind(entry.status.as_str())
    .bind(&entry.partition_key)
    .bind(entry.created_at)
    .execute(executor)
    .await
    .map_err(db_error("write outbox entry"))?;
    Ok(())
}

#[async_trait]
impl OutboxWriter for PostgresOutboxWriter {
    async fn write(&self, event: &EventEnvelope, partition_key: &str) -> Result<OutboxEntry, DomainError> {
        let entry = OutboxEntry::new(event.clone(), partition_key);
        insert(&mut *self.session.conn().await?, &entry).await?;
        Ok(entry)
    }

    async fn write_batch(
        &self,
        events: &[EventEnvelope],
        partition_key: &str,
    ) -> Result<Vec<OutboxEntry>, DomainError> {
        let entries: Vec<OutboxEntry> = events
            .iter()
            .map(|event| OutboxEntry::new(event.clone(), partition_key))
            .collect();
        if self.session.is_transactional() {
            let mut conn = self.session.conn().await?;
            for entry in &entries {
                insert(&mut *conn, entry).await?;
            }
            return Ok(entries);
        }

        let mut tx = self.session.pool().begin().await.map_err(db_error("begin outbox batch"))?;
        for entry in &entries {
            insert(&mut *tx, entry).await?;
        }
        tx.commit().await.map_err(db_error("commit outbox batch"))?;
        Ok(entries)
    }

    async fn get_pending(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload, status, partition_key, attempts, last_error, created_at, processed_at
            FROM event_outbox
            WHERE status = 'pending' OR (status = 'failed' AND attempts < $1)
            ORDER BY created_at, id
            LIMIT $2
            "#,
        )
        .bind(OutboxEntry::MAX_ATTEMPTS as i32)
        .bind(i64::from(limit))
        .fetch_all(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("fetch pending outbox entries"))?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE event_outbox
            SET status = 'published', processed_at = NOW(), attempts = attempts + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("mark outbox entry published"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Outbox entry", id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE event_outbox
            SET status = 'failed', processed_at = NOW(), attempts = attempts + 1, last_error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("mark outbox entry failed"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Outbox entry", id));
        }
        Ok(())
    }

    async fn cleanup_old(&self, older_than_hours: u32) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - Duration::hours(i64::from(older_than_hours));
        let result = sqlx::query(
            "DELETE FROM event_outbox WHERE status = 'published' AND processed_at <= $1",
        )
        .bind(cutoff)
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("clean up outbox"))?;
        Ok(result.rows_affected())
    }
}
