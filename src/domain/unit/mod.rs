//! Unit module - containers for elements within a client.

mod aggregate;
mod events;

pub use aggregate::{Unit, MAX_UNIT_NAME_LENGTH};
pub use events::{UnitCreated, UnitDeleted, UnitUpdated};
