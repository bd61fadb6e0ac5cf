//! HTTP adapter for elements and their compliance data.
//!
//! - `GET /elements` (filtered, paged), `POST /elements`
//! - `GET /elements/:id`, `PUT /elements/:id`, `DELETE /elements/:id`
//! - `GET /elements/:id/control-implementations`
//! - `GET|PUT /elements/:id/requirement-implementations/:control_id`
//! - `GET /elements/:id/control-implementations/:control_id/requirement-implementations`
//! - `GET /control-implementations?control=<id>`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::element_router;
