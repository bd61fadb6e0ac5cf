//! Command infrastructure for use case handlers.
//!
//! Every handler receives a `CommandMetadata` next to its command. It carries
//! the caller's access rights and the correlation context that is copied
//! onto emitted events.

use uuid::Uuid;

use super::{ClientId, EventEnvelope, UserAccessRights, UserId};

/// Caller context for a single use case invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    rights: UserAccessRights,
    is_admin: bool,
    correlation_id: Option<String>,
    source: Option<String>,
}

impl CommandMetadata {
    pub fn new(rights: UserAccessRights) -> Self {
        Self {
            rights,
            is_admin: false,
            correlation_id: None,
            source: None,
        }
    }

    /// Metadata for background jobs acting with system rights on a client.
    pub fn system(client_id: ClientId) -> Self {
        Self::new(UserAccessRights::system(client_id)).with_source("system")
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Source of the command, e.g. "api" or "messaging".
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn rights(&self) -> &UserAccessRights {
        &self.rights
    }

    pub fn user_id(&self) -> &UserId {
        self.rights.username()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Copies correlation, user, and client onto an outgoing envelope.
    pub fn stamp(&self, envelope: EventEnvelope) -> EventEnvelope {
        let envelope = envelope
            .with_correlation_id(self.correlation_id())
            .with_user_id(self.user_id().to_string());
        match self.rights.client_id() {
            Some(client_id) => envelope.with_client_id(client_id.to_string()),
            None => envelope,
        }
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Unrestricted metadata for `client_id`, as a regular non-admin user.
    pub fn test_fixture(client_id: ClientId) -> Self {
        Self::new(UserAccessRights::new(
            UserId::new("test-user").unwrap(),
            Some(client_id),
            vec!["veo-user".to_string(), "veo-write".to_string()],
            Default::default(),
            Default::default(),
        ))
        .with_correlation_id("test-correlation-id")
        .with_source("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_returns_set_value() {
        let metadata = CommandMetadata::test_fixture(ClientId::new());
        assert_eq!(metadata.correlation_id(), "test-correlation-id");
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        let metadata = CommandMetadata::new(UserAccessRights::anonymous());
        assert!(!metadata.correlation_id().is_empty());
    }

    #[test]
    fn system_metadata_uses_system_user() {
        let client = ClientId::new();
        let metadata = CommandMetadata::system(client);
        assert_eq!(metadata.user_id().as_str(), "system");
        assert_eq!(metadata.rights().client_id(), Some(client));
        assert_eq!(metadata.source(), Some("system"));
        assert!(!metadata.is_admin());
    }

    #[test]
    fn stamp_copies_context_onto_envelope() {
        let client = ClientId::new();
        let metadata = CommandMetadata::test_fixture(client);

        let envelope = metadata.stamp(EventEnvelope::test_fixture());

        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("test-correlation-id"));
        assert_eq!(envelope.metadata.user_id.as_deref(), Some("test-user"));
        assert_eq!(envelope.metadata.client_id, Some(client.to_string()));
    }
}
