//! Authentication configuration (OIDC resource server)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Realm issuer, e.g. `https://auth.verinice.com/auth/realms/verinice-veo`.
    pub issuer_url: String,

    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Production requires an HTTPS issuer.
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.issuer_url.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__AUTH__ISSUER_URL"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__AUTH__AUDIENCE"));
        }
        if environment == Environment::Production && !self.issuer_url.starts_with("https://") {
            return Err(ValidationError::IssuerMustBeHttps);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            audience: default_audience(),
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
        }
    }
}

fn default_audience() -> String {
    "veo-rest".to_string()
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}
