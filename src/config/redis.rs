//! Redis configuration (event broker)

use serde::Deserialize;

use super::error::ValidationError;

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Events go to `<prefix>.<aggregate type>`.
    #[serde(default = "default_event_channel_prefix")]
    pub event_channel_prefix: String,

    /// Channel carrying client lifecycle messages.
    #[serde(default = "default_client_change_channel")]
    pub client_change_channel: String,
}

impl RedisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.event_channel_prefix.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__REDIS__EVENT_CHANNEL_PREFIX"));
        }
        if self.client_change_channel.is_empty() {
            return Err(ValidationError::MissingRequired("VEO__REDIS__CLIENT_CHANGE_CHANNEL"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            event_channel_prefix: default_event_channel_prefix(),
            client_change_channel: default_client_change_channel(),
        }
    }
}

fn default_event_channel_prefix() -> String {
    "veo".to_string()
}

fn default_client_change_channel() -> String {
    "veo.subscriptions.client_change".to_string()
}
