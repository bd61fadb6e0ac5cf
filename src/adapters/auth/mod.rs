//! Authentication adapters implementing the `SessionValidator` port.
//!
//! - `oidc` - JWKS-backed validation of the identity provider's tokens
//! - `mock` - fixed token table for tests and local development

mod mock;
mod oidc;

pub use mock::MockSessionValidator;
pub use oidc::{OidcConfig, OidcSessionValidator};
