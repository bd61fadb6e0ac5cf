//! PostgreSQL implementation of DomainRepository.
//!
//! The whole aggregate lives in the `data` JSONB column; `client_id`,
//! `name`, and `active` are copied out for lookups.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::domains::Domain;
use crate::domain::foundation::{ClientId, DomainError, DomainId};
use crate::ports::DomainRepository;

use super::{missed_update, PgSession, db_error, not_found};

#[derive(Clone)]
pub struct PostgresDomainRepository {
    session: PgSession,
}

impl PostgresDomainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_session(PgSession::pooled(pool))
    }

    pub fn with_session(session: PgSession) -> Self {
        Self { session }
    }

    async fn fetch_where(&self, clause: &str, client_id: &ClientId) -> Result<Vec<Domain>, DomainError> {
        let rows: Vec<(Json<Domain>,)> = sqlx::query_as(&format!(
            "SELECT data FROM domains WHERE client_id = $1 {} ORDER BY name, id",
            clause
        ))
        .bind(client_id.as_uuid())
        .fetch_all(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("fetch domains"))?;
        Ok(rows.into_iter().map(|(Json(domain),)| domain).collect())
    }
}

#[async_trait]
impl DomainRepository for PostgresDomainRepository {
    async fn save(&self, domain: &Domain) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO domains (id, client_id, name, active, data, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(domain.id().as_uuid())
        .bind(domain.client_id().as_uuid())
        .bind(domain.name())
        .bind(domain.is_active())
        .bind(Json(domain))
        .bind(domain.version())
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("insert domain"))?;
        Ok(())
    }

    async fn update(&self, domain: &Domain) -> Result<(), DomainError> {
        let mut conn = self.session.conn().await?;
        let result = sqlx::query(
            r#"
            UPDATE domains SET name = $2, active = $3, data = $4, version = $5
            WHERE id = $1 AND version = $5 - 1
            "#,
        )
        .bind(domain.id().as_uuid())
        .bind(domain.name())
        .bind(domain.is_active())
        .bind(Json(domain))
        .bind(domain.version())
        .execute(&mut *conn)
        .await
        .map_err(db_error("update domain"))?;

        if result.rows_affected() == 0 {
            let id = *domain.id().as_uuid();
            return Err(missed_update(&mut conn, "domains", "Domain", id, domain.version()).await);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>, DomainError> {
        let row: Option<(Json<Domain>,)> = sqlx::query_as("SELECT data FROM domains WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch domain"))?;
        Ok(row.map(|(Json(domain),)| domain))
    }

    async fn find_active_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError> {
        self.fetch_where("AND active", client_id).await
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Domain>, DomainError> {
        self.fetch_where("", client_id).await
    }

    async fn delete(&self, id: &DomainId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM domains WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("delete domain"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Domain", id));
        }
        Ok(())
    }
}
