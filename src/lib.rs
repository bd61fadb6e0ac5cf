//! veo - governance, risk and compliance backend.
//!
//! Clients own units, units own elements (assets, controls, documents,
//! incidents, persons, processes, scenarios, scopes). Domains customize
//! what elements look like and carry the decisions, inspections, and risk
//! definitions evaluated against them.
//!
//! The crate follows a hexagonal layout: `domain` holds the model,
//! `ports` the interfaces, `application` the use cases, and `adapters`
//! the PostgreSQL, redis, OIDC, and HTTP implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
