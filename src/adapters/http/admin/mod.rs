//! HTTP adapter for administrative operations.
//!
//! - `DELETE /admin/clients/:id` - removes a client with all its data

pub mod handlers;
pub mod routes;

pub use routes::admin_router;
