//! Route configuration for domain endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{
    create_domain, delete_decision, delete_inspection, element_schema, element_status_count,
    evaluate, get_domain, list_domains, migrate_domain, put_decision, put_element_type_definition,
    put_inspection, put_risk_definition,
};

pub fn domain_router() -> Router<AppState> {
    Router::new()
        .route("/domains", get(list_domains))
        .route("/domains/:id", get(get_domain))
        .route("/domains/:id/element-status-count", get(element_status_count))
        .route("/domains/:id/evaluation", post(evaluate))
        .route("/domains/:id/migrate", post(migrate_domain))
        .route("/domains/:id/:element_type/json-schema", get(element_schema))
        .route("/content-creation/domains", post(create_domain))
        .route(
            "/content-creation/domains/:id/element-type-definitions/:element_type",
            put(put_element_type_definition),
        )
        .route(
            "/content-creation/domains/:id/decisions/:key",
            put(put_decision).delete(delete_decision),
        )
        .route(
            "/content-creation/domains/:id/inspections/:key",
            put(put_inspection).delete(delete_inspection),
        )
        .route(
            "/content-customizing/domains/:id/risk-definitions/:risk_definition",
            put(put_risk_definition),
        )
}
