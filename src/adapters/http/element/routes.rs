//! Route configuration for element endpoints.

use axum::routing::get;
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{
    control_implementations_of_control, create_element, delete_element,
    element_control_implementations, get_element, get_requirement_implementation, list_elements,
    list_requirement_implementations, update_element, update_requirement_implementation,
};

pub fn element_router() -> Router<AppState> {
    Router::new()
        .route("/elements", get(list_elements).post(create_element))
        .route(
            "/elements/:id",
            get(get_element).put(update_element).delete(delete_element),
        )
        .route(
            "/elements/:id/control-implementations",
            get(element_control_implementations),
        )
        .route(
            "/elements/:id/control-implementations/:control_id/requirement-implementations",
            get(list_requirement_implementations),
        )
        .route(
            "/elements/:id/requirement-implementations/:control_id",
            get(get_requirement_implementation).put(update_requirement_implementation),
        )
        .route(
            "/control-implementations",
            get(control_implementations_of_control),
        )
}
