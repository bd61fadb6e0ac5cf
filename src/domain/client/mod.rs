//! Client module - tenants and their lifecycle.

mod aggregate;
mod events;

pub use aggregate::{Client, ClientChangeType, ClientState};
pub use events::{ClientDeleted, ClientStateChanged};
