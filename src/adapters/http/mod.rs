//! HTTP adapters - REST API implementations.
//!
//! Each area has its own module with DTOs, handlers, and routes. All API
//! routes live under `/api` behind `auth_middleware`; `/health` is open.

pub mod admin;
pub mod domain;
pub mod element;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod state;
pub mod unit;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use error::{ApiError, ErrorResponse};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
pub use state::AppState;

/// Router of the REST API without transport layers.
pub fn api_router(state: AppState, validator: AuthState) -> Router {
    let api = Router::new()
        .merge(unit::unit_router())
        .merge(domain::domain_router())
        .merge(element::element_router())
        .merge(admin::admin_router())
        .layer(axum::middleware::from_fn_with_state(validator, auth_middleware))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
}

/// Adds request ids, tracing, compression, CORS, and the request timeout.
pub fn with_http_layers(router: Router, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(middleware::auth::REQUEST_ID_HEADER);
    router
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([header::ETAG])
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "UP" }))
}

