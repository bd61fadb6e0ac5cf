//! PostgreSQL implementation of ClientRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::client::{Client, ClientState};
use crate::domain::foundation::{ClientId, DomainError, DomainId, Timestamp};
use crate::ports::ClientRepository;

use super::{missed_update, PgSession, corrupt, db_error, not_found};

#[derive(Clone)]
pub struct PostgresClientRepository {
    session: PgSession,
}

impl PostgresClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_session(PgSession::pooled(pool))
    }

    pub fn with_session(session: PgSession) -> Self {
        Self { session }
    }
}

fn domain_uuids(client: &Client) -> Vec<Uuid> {
    client.domains().iter().map(|d| *d.as_uuid()).collect()
}

fn row_to_client(row: PgRow) -> Result<Client, DomainError> {
    let read = |e: sqlx::Error| corrupt("client", e);
    let state: String = row.try_get("state").map_err(read)?;
    let max_units: Option<i32> = row.try_get("max_units").map_err(read)?;
    let domains: Vec<Uuid> = row.try_get("domains").map_err(read)?;
    Ok(Client::reconstitute(
        ClientId::from_uuid(row.try_get("id").map_err(read)?),
        row.try_get("name").map_err(read)?,
        state.parse::<ClientState>()?,
        max_units.map(|m| m.max(0) as u32),
        domains.into_iter().map(DomainId::from_uuid).collect(),
        row.try_get("version").map_err(read)?,
        Timestamp::from_datetime(row.try_get("created_at").map_err(read)?),
        Timestamp::from_datetime(row.try_get("updated_at").map_err(read)?),
    ))
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn save(&self, client: &Client) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, state, max_units, domains, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(client.id().as_uuid())
        .bind(client.name())
        .bind(client.state().as_str())
        .bind(client.max_units().map(|m| m as i32))
        .bind(domain_uuids(client))
        .bind(client.version())
        .bind(client.created_at().as_datetime())
        .bind(client.updated_at().as_datetime())
        .execute(&mut *self.session.conn().await?)
        .await
        .map_err(db_error("insert client"))?;
        Ok(())
    }

    async fn update(&self, client: &Client) -> Result<(), DomainError> {
        let mut conn = self.session.conn().await?;
        let result = sqlx::query(
            r#"
            UPDATE clients SET
                name = $2, state = $3, max_units = $4, domains = $5,
                version = $6, updated_at = $7
            WHERE id = $1 AND version = $6 - 1
            "#,
        )
        .bind(client.id().as_uuid())
        .bind(client.name())
        .bind(client.state().as_str())
        .bind(client.max_units().map(|m| m as i32))
        .bind(domain_uuids(client))
        .bind(client.version())
        .bind(client.updated_at().as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(db_error("update client"))?;

        if result.rows_affected() == 0 {
            let id = *client.id().as_uuid();
            return Err(missed_update(&mut conn, "clients", "Client", id, client.version()).await);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        sqlx::query("SELECT * FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("fetch client"))?
            .map(row_to_client)
            .transpose()
    }

    async fn exists(&self, id: &ClientId) -> Result<bool, DomainError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("check client existence"))?;
        Ok(count > 0)
    }

    async fn delete(&self, id: &ClientId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.session.conn().await?)
            .await
            .map_err(db_error("delete client"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Client", id));
        }
        Ok(())
    }
}
