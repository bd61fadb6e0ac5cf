//! Route configuration for admin endpoints.

use axum::routing::delete;
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::delete_client;

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/admin/clients/:id", delete(delete_client))
}
