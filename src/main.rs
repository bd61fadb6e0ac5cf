//! veo server binary.
//!
//! Wires PostgreSQL repositories, the transactional outbox, redis pub/sub,
//! and OIDC token validation into the REST API.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use veo::adapters::auth::{OidcConfig, OidcSessionValidator};
use veo::adapters::events::{
    ClientChangeSubscriber, OutboxEventPublisher, OutboxPublisher, OutboxPublisherConfig,
    RedisEventPublisher,
};
use veo::adapters::http::{api_router, with_http_layers, AppState, AuthState};
use veo::adapters::postgres::{
    PostgresClientRepository, PostgresDomainRepository, PostgresElementRepository,
    PostgresOutboxWriter, PostgresTransactionManager, PostgresUnitRepository,
};
use veo::adapters::validation::JsonSchemaValidator;
use veo::application::{ETagSalt, HandleClientChangeHandler};
use veo::config::{AppConfig, LogFormat, ServerConfig};
use veo::ports::{EventPublisher, OutboxWriter, Repositories, TransactionManager};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.connect_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let outbox: Arc<dyn OutboxWriter> = Arc::new(PostgresOutboxWriter::new(pool.clone()));
    let event_publisher: Arc<dyn EventPublisher> =
        Arc::new(OutboxEventPublisher::new(outbox.clone()));

    let transactions: Arc<dyn TransactionManager> =
        Arc::new(PostgresTransactionManager::new(pool.clone()));
    let state = AppState::new(
        Repositories {
            clients: Arc::new(PostgresClientRepository::new(pool.clone())),
            units: Arc::new(PostgresUnitRepository::new(pool.clone())),
            domains: Arc::new(PostgresDomainRepository::new(pool.clone())),
            elements: Arc::new(PostgresElementRepository::new(pool.clone())),
            event_publisher,
        },
        Arc::new(JsonSchemaValidator::new()),
        transactions.clone(),
        ETagSalt::new(config.security.etag_salt.expose_secret()),
    );

    let validator: AuthState = Arc::new(OidcSessionValidator::new(
        OidcConfig::new(&config.auth.issuer_url, &config.auth.audience)
            .with_cache_duration(config.auth.jwks_cache_ttl()),
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let redis = redis::Client::open(config.redis.url.as_str())?;
    let mut background = Vec::new();

    if config.messaging.publishing_enabled {
        let broker = RedisEventPublisher::new(
            redis.get_multiplexed_tokio_connection().await?,
            config.redis.event_channel_prefix.clone(),
        );
        let publisher = OutboxPublisher::with_config(
            outbox.clone(),
            Arc::new(broker),
            OutboxPublisherConfig::default()
                .with_poll_interval(config.messaging.poll_interval())
                .with_batch_size(config.messaging.batch_size)
                .with_cleanup(
                    config.messaging.cleanup_interval(),
                    config.messaging.retention_hours,
                ),
        );
        let shutdown = shutdown_rx.clone();
        background.push(tokio::spawn(async move {
            if let Err(e) = publisher.run(shutdown).await {
                tracing::error!(error = %e, "Outbox publisher failed");
            }
        }));
    } else {
        tracing::warn!("Event publishing is disabled, events stay in the outbox");
    }

    let client_changes = ClientChangeSubscriber::new(
        Arc::new(HandleClientChangeHandler::new(transactions)),
        config.redis.client_change_channel.clone(),
    );
    let shutdown = shutdown_rx.clone();
    background.push(tokio::spawn(async move {
        if let Err(e) = client_changes.run(redis, shutdown).await {
            tracing::error!(error = %e, "Client change subscriber failed");
        }
    }));

    let app = with_http_layers(api_router(state, validator), &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "veo listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down background tasks");
    let _ = shutdown_tx.send(true);
    for task in background {
        let _ = task.await;
    }
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
}
