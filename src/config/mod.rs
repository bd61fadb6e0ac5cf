//! Application configuration.
//!
//! Values come from environment variables with the `VEO` prefix; nested
//! keys are separated by `__`. A `.env` file is read first when present.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VEO__SERVER__PORT` | `server.port` |
//! | `VEO__DATABASE__URL` | `database.url` |
//! | `VEO__AUTH__ISSUER_URL` | `auth.issuer_url` |
//! | `VEO__REDIS__URL` | `redis.url` |
//! | `VEO__MESSAGING__BATCH_SIZE` | `messaging.batch_size` |
//! | `VEO__SECURITY__ETAG_SALT` | `security.etag_salt` |
//!
//! ```no_run
//! use veo::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod messaging;
mod redis;
mod security;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use messaging::MessagingConfig;
pub use redis::RedisConfig;
pub use security::SecurityConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use std::path::Path;

use serde::Deserialize;

pub const ENV_PREFIX: &str = "VEO";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    pub redis: RedisConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    pub security: SecurityConfig,
}

impl AppConfig {
    /// Loads `.env` (if any) and the process environment.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadError` when required values are missing or
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_environment()
    }

    /// Like [`AppConfig::load`], with an explicit env file that must exist.
    pub fn load_with_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Self::from_environment()
    }

    fn from_environment() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(self.server.environment)?;
        self.redis.validate()?;
        self.messaging.validate()?;
        self.security.validate(self.server.environment)?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MINIMAL: &[(&str, &str)] = &[
        ("VEO__DATABASE__URL", "postgresql://veo@localhost/veo"),
        ("VEO__AUTH__ISSUER_URL", "https://auth.example.com/realms/veo"),
        ("VEO__REDIS__URL", "redis://localhost:6379"),
        ("VEO__SECURITY__ETAG_SALT", "a-long-enough-etag-salt"),
    ];

    const EXTRA: &[&str] = &[
        "VEO__SERVER__PORT",
        "VEO__SERVER__ENVIRONMENT",
        "VEO__SERVER__LOG_FORMAT",
        "VEO__MESSAGING__BATCH_SIZE",
    ];

    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in MINIMAL.iter().chain(vars) {
            env::set_var(key, value);
        }
        let result = f();
        for (key, _) in MINIMAL {
            env::remove_var(key);
        }
        for key in EXTRA {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn loads_minimal_environment_with_defaults() {
        let config = with_env(&[], AppConfig::from_environment).unwrap();

        assert_eq!(config.database.url, "postgresql://veo@localhost/veo");
        assert_eq!(config.server.port, 8070);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.redis.event_channel_prefix, "veo");
        assert_eq!(config.messaging.batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_overrides_apply() {
        let config = with_env(
            &[
                ("VEO__SERVER__PORT", "9000"),
                ("VEO__SERVER__ENVIRONMENT", "production"),
                ("VEO__SERVER__LOG_FORMAT", "json"),
                ("VEO__MESSAGING__BATCH_SIZE", "5"),
            ],
            AppConfig::from_environment,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.messaging.batch_size, 5);
    }

    #[test]
    fn missing_database_fails_to_load() {
        let result = with_env(&[], || {
            env::remove_var("VEO__DATABASE__URL");
            AppConfig::from_environment()
        });

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn reads_values_from_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VEO__SERVER__PORT=7777").unwrap();

        let config = with_env(&[], || AppConfig::load_with_env_file(file.path())).unwrap();

        assert_eq!(config.server.port, 7777);
        assert_eq!(config.security.etag_salt.expose_secret(), "a-long-enough-etag-salt");
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let result = with_env(&[], || AppConfig::load_with_env_file("/nonexistent/veo.env"));

        assert!(matches!(result, Err(ConfigError::EnvFile(_))));
    }
}
