//! HTTP adapter for units.
//!
//! - `GET /units[?parent=<id>]` - units of the caller's client
//! - `POST /units` - create a unit
//! - `GET /units/:id`, `PUT /units/:id`, `DELETE /units/:id`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::unit_router;
