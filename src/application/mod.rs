//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::client::{
    ClientChangeCommand, DeleteClientCommand, DeleteClientHandler, HandleClientChangeHandler,
};
pub use handlers::domain::{
    ElementStatusCountHandler, ElementStatusCountQuery, GetDomainHandler, GetDomainQuery,
    GetElementSchemaHandler, GetElementSchemaQuery, ListDomainsHandler, MigrateDomainCommand,
    MigrateDomainHandler, MigrationOutcome,
};
pub use handlers::ETagSalt;
