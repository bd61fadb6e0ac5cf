//! Secrets

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const MIN_PRODUCTION_SALT: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key of the ETag headers.
    pub etag_salt: SecretString,
}

impl SecurityConfig {
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        let salt = self.etag_salt.expose_secret();
        if salt.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__SECURITY__ETAG_SALT"));
        }
        if environment == Environment::Production && salt.len() < MIN_PRODUCTION_SALT {
            return Err(ValidationError::WeakEtagSalt(MIN_PRODUCTION_SALT));
        }
        Ok(())
    }
}
