//! PostgreSQL implementation of UnitRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{ClientId, DomainError, DomainId, Timestamp, UnitId};
use crate::domain::unit::Unit;
use crate::ports::UnitRepository;

use super::{missed_update, PgSession, corrupt, db_error, not_found};

const COLUMNS: &str =
    "id, client_id, name, abbreviation, description, parent_id, domains, version, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresUnitRepository {
    session: PgSession,
}

impl PostgresUnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_session(PgSession::pooled(pool))
    }

    pub fn with_session(session: PgSession) -> Self {
        Self { session }
    }
}

fn row_to_unit(row: PgRow) -> Result<Unit, DomainError> {
    let read = |e: sqlx::Error| corrupt("unit", e);
    let parent: Option<Uuid> = row.try_get("parent_id").map_err(read)?;
    let domains: Vec<Uuid> = row.try_get("domains").map_err(read)?;
    Ok(Unit::reconstitute(
        UnitId::from_uuid(row.try_get("id").map_err(read)?),
        ClientId::from_uuid(row.try_get("client_id").map_err(read)?),
        row.try_get("name").map_err(read)?,
        row.try_get("abbreviation").map_err(read)?,
        row.try_get("description").map_err(read)?,
        parent.map(UnitId::from_uuid),
        domains.into_iter().map(DomainId::from_uuid).collect(),
        row.try_get("version").map_err(read)?,
        Timestamp::from_datetime(row.try_get("created_at").map_err(read)?),
        Timestamp::from_datetime(row.try_get("updated_at").map_err(read)?),
    ))
}

fn domain_uuids(unit: &Unit) -> Vec<Uuid> {
    unit.domains().iter().map(|d| *d.as_uuid()).collect()
}

#[async_trait]
impl UnitRepository for PostgresUnitRepository {
    async fn save(&self, unit: &Unit) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO units ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            COLUMNS
        ))
        .bind(unit.id().as_uuid())
        .bind(unit.client_id().as_uuid())
        .bind(unit.name())
        .bind(unit.abbreviation())
        .bind(unit.description())
        .bind(unit.parent_id().map(|p| *p.as_uuid()))
        .bind(domain_uuids(unit))
        .bind(unit.version())
        .bind(unit.created_at().as_datetime())
        .bind(unit.updated_at().as_datetime())
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("insert unit"))?;
        Ok(())
    }

    async fn update(&self, unit: &Unit) -> Result<(), DomainError> {
        let mut conn = self.session.conn().await?;
        let result = sqlx::query(
            r#"
            UPDATE units SET
                name = $2, abbreviation = $3, description = $4, parent_id = $5,
                domains = $6, version = $7, updated_at = $8
            WHERE id = $1 AND version = $7 - 1
            "#,
        )
        .bind(unit.id().as_uuid())
        .bind(unit.name())
        .bind(unit.abbreviation())
        .bind(unit.description())
        .bind(unit.parent_id().map(|p| *p.as_uuid()))
        .bind(domain_uuids(unit))
        .bind(unit.version())
        .bind(unit.updated_at().as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(db_error("update unit"))?;

        if result.rows_affected() == 0 {
            let id = *unit.id().as_uuid();
            return Err(missed_update(&mut conn, "units", "Unit", id, unit.version()).await);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UnitId) -> Result<Option<Unit>, DomainError> {
        sqlx::query(&format!("SELECT {} FROM units WHERE id = $1", COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch unit"))?
            .map(row_to_unit)
            .transpose()
    }

    async fn find_by_client(
        &self,
        client_id: &ClientId,
        parent: Option<&UnitId>,
    ) -> Result<Vec<Unit>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM units
            WHERE client_id = $1 AND ($2::uuid IS NULL OR parent_id = $2)
            ORDER BY name, id
            "#,
            COLUMNS
        ))
        .bind(client_id.as_uuid())
        .bind(parent.map(|p| *p.as_uuid()))
        .fetch_all(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("fetch units by client"))?;

        rows.into_iter().map(row_to_unit).collect()
    }

    async fn count_by_client(&self, client_id: &ClientId) -> Result<usize, DomainError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM units WHERE client_id = $1")
            .bind(client_id.as_uuid())
            .fetch_one(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("count units"))?;
        Ok(count.max(0) as usize)
    }

    async fn delete(&self, id: &UnitId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("delete unit"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Unit", id));
        }
        Ok(())
    }
}
