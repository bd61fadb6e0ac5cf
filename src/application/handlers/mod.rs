//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Every
//! handler is built from ports and takes the caller's `CommandMetadata`.

pub mod client;
pub mod compliance;
pub mod domain;
pub mod element;
pub mod unit;

mod support;

#[cfg(test)]
pub(crate) mod testing;

pub use support::ETagSalt;
