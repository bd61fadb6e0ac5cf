//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, errors, events, access rights)
//! - `client` - Tenants and their lifecycle
//! - `unit` - Element containers within a client
//! - `domains` - Methodology frameworks customizing element shapes and risks
//! - `element` - GRC objects, their domain associations, risks, and controls
//! - `condition` - Expressions evaluated against elements
//! - `decision` - Rule-based classification of elements
//! - `inspection` - Checks producing findings and suggestions

pub mod client;
pub mod condition;
pub mod decision;
pub mod domains;
pub mod element;
pub mod foundation;
pub mod inspection;
pub mod unit;
