//! Connection source of the postgres repositories.
//!
//! A pooled session checks out a fresh connection per statement. A
//! transactional session routes every statement of every repository built
//! on it through one shared transaction, so a use case's writes and the
//! outbox rows of its events commit together.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::debug;

use crate::adapters::events::OutboxEventPublisher;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{Repositories, TransactionManager, UnitOfWork};

use super::{
    db_error, PostgresClientRepository, PostgresDomainRepository, PostgresElementRepository,
    PostgresOutboxWriter, PostgresUnitRepository,
};

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

#[derive(Clone)]
pub struct PgSession {
    pool: PgPool,
    tx: Option<SharedTransaction>,
}

/// Connection a statement runs on.
pub(super) enum Conn<'a> {
    Pooled(PoolConnection<Postgres>),
    Shared(MappedMutexGuard<'a, PgConnection>),
}

impl Deref for Conn<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Conn::Pooled(c) => c,
            Conn::Shared(c) => c,
        }
    }
}

impl DerefMut for Conn<'_> {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Conn::Pooled(c) => c,
            Conn::Shared(c) => c,
        }
    }
}

impl PgSession {
    pub fn pooled(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    fn transactional(pool: PgPool, tx: SharedTransaction) -> Self {
        Self { pool, tx: Some(tx) }
    }

    pub(super) fn is_transactional(&self) -> bool {
        self.tx.is_some()
    }

    pub(super) fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Hold the returned connection for as short as possible; while a
    /// transactional one is held, other repositories of the same unit of
    /// work wait for it.
    pub(super) async fn conn(&self) -> Result<Conn<'_>, DomainError> {
        match &self.tx {
            None => self
                .pool
                .acquire()
                .await
                .map(Conn::Pooled)
                .map_err(db_error("acquire connection")),
            Some(tx) => MutexGuard::try_map(tx.lock().await, |t| t.as_deref_mut())
                .map(Conn::Shared)
                .map_err(|_| {
                    DomainError::new(ErrorCode::DatabaseError, "Transaction already finished")
                }),
        }
    }
}

/// Begins one database transaction per unit of work.
#[derive(Clone)]
pub struct PostgresTransactionManager {
    pool: PgPool,
}

impl PostgresTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PostgresUnitOfWork {
    tx: SharedTransaction,
    repositories: Repositories,
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;
        let tx: SharedTransaction = Arc::new(Mutex::new(Some(tx)));
        let session = PgSession::transactional(self.pool.clone(), tx.clone());
        let outbox = Arc::new(PostgresOutboxWriter::with_session(session.clone()));
        let repositories = Repositories {
            clients: Arc::new(PostgresClientRepository::with_session(session.clone())),
            units: Arc::new(PostgresUnitRepository::with_session(session.clone())),
            domains: Arc::new(PostgresDomainRepository::with_session(session.clone())),
            elements: Arc::new(PostgresElementRepository::with_session(session)),
            event_publisher: Arc::new(OutboxEventPublisher::new(outbox)),
        };
        Ok(Box::new(PostgresUnitOfWork { tx, repositories }))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let tx = self.tx.lock().await.take().ok_or_else(|| {
            DomainError::new(ErrorCode::DatabaseError, "Transaction already finished")
        })?;
        tx.commit().await.map_err(db_error("commit transaction"))?;
        debug!("Transaction committed");
        Ok(())
    }
}
