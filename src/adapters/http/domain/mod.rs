//! HTTP adapter for domains.
//!
//! - `GET /domains`, `GET /domains/:id`
//! - `GET /domains/:id/element-status-count?unit=<id>`
//! - `GET /domains/:id/:elementType/json-schema`
//! - `POST /domains/:id/evaluation` - decisions and inspections for an element
//! - `POST /domains/:id/migrate` - admin only

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::domain_router;
