//! Route configuration for unit endpoints.

use axum::routing::get;
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{create_unit, delete_unit, get_unit, list_units, update_unit};

pub fn unit_router() -> Router<AppState> {
    Router::new()
        .route("/units", get(list_units).post(create_unit))
        .route("/units/:id", get(get_unit).put(update_unit).delete(delete_unit))
}
