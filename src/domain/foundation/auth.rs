//! Authentication types for the domain layer.
//!
//! An `AuthenticatedUser` is what the `SessionValidator` port produces from
//! a bearer token. The OIDC adapter fills it from Keycloak-style claims;
//! the mock adapter fills it directly.

use std::collections::HashSet;

use thiserror::Error;

use super::{ClientId, UnitId, UserAccessRights, UserId};

/// Role granting administrative operations (client deletion, migrations).
pub const ADMIN_ROLE: &str = "veo-admin";

/// Role granting domain authoring (definitions, decisions, inspections).
pub const CONTENT_CREATOR_ROLE: &str = "veo-content-creator";

/// Group prefix carrying the client id, e.g. `/veo_client:<uuid>`.
pub const CLIENT_GROUP_PREFIX: &str = "/veo_client:";

/// Authenticated user extracted from a validated JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: UserId,
    pub client_id: ClientId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
    pub readable_unit_ids: HashSet<UnitId>,
    pub writable_unit_ids: HashSet<UnitId>,
    pub max_units: Option<u32>,
}

impl AuthenticatedUser {
    pub fn new(username: UserId, client_id: ClientId, roles: Vec<String>) -> Self {
        Self {
            username,
            client_id,
            email: None,
            display_name: None,
            roles,
            readable_unit_ids: HashSet::new(),
            writable_unit_ids: HashSet::new(),
            max_units: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_unit_access(
        mut self,
        readable: impl IntoIterator<Item = UnitId>,
        writable: impl IntoIterator<Item = UnitId>,
    ) -> Self {
        self.readable_unit_ids = readable.into_iter().collect();
        self.writable_unit_ids = writable.into_iter().collect();
        self
    }

    pub fn with_max_units(mut self, max_units: u32) -> Self {
        self.max_units = Some(max_units);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }

    /// Access rights of this user for use case checks.
    pub fn access_rights(&self) -> UserAccessRights {
        UserAccessRights::new(
            self.username.clone(),
            Some(self.client_id),
            self.roles.clone(),
            self.readable_unit_ids.clone(),
            self.writable_unit_ids.clone(),
        )
    }

    /// Extracts the client id from the `groups` claim.
    ///
    /// Exactly one group of the form `/veo_client:<uuid>` must be present.
    pub fn client_id_from_groups(groups: &[String]) -> Result<ClientId, AuthError> {
        let ids: Vec<ClientId> = groups
            .iter()
            .filter_map(|g| g.strip_prefix(CLIENT_GROUP_PREFIX))
            .filter_map(|raw| raw.parse::<ClientId>().ok())
            .collect();

        match ids.as_slice() {
            [id] => Ok(*id),
            _ => Err(AuthError::InvalidClaims(format!(
                "Expected 1 client for the account. Got {}.",
                ids.len()
            ))),
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Signature is fine but the claims do not describe a usable account.
    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser::new(
            UserId::new("alice").unwrap(),
            ClientId::new(),
            roles.iter().map(|r| r.to_string()).collect(),
        )
    }

    #[test]
    fn admin_role_makes_admin() {
        assert!(user(&["veo-user", "veo-admin"]).is_admin());
        assert!(!user(&["veo-user", "veo-write"]).is_admin());
    }

    #[test]
    fn client_id_is_extracted_from_single_group() {
        let id = ClientId::new();
        let groups = vec!["/other".to_string(), format!("/veo_client:{}", id)];
        assert_eq!(AuthenticatedUser::client_id_from_groups(&groups).unwrap(), id);
    }

    #[test]
    fn client_id_extraction_rejects_zero_or_many() {
        let err = AuthenticatedUser::client_id_from_groups(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid token claims: Expected 1 client for the account. Got 0."
        );

        let groups = vec![
            format!("/veo_client:{}", ClientId::new()),
            format!("/veo_client:{}", ClientId::new()),
        ];
        assert!(AuthenticatedUser::client_id_from_groups(&groups).is_err());
    }

    #[test]
    fn malformed_client_group_is_ignored() {
        let groups = vec!["/veo_client:not-a-uuid".to_string()];
        assert!(AuthenticatedUser::client_id_from_groups(&groups).is_err());
    }

    #[test]
    fn access_rights_carry_units_and_client() {
        let unit = UnitId::new();
        let u = user(&["unit_access_restriction"]).with_unit_access([unit], [unit]);
        let rights = u.access_rights();
        assert_eq!(rights.client_id(), Some(u.client_id));
        assert!(rights.is_unit_access_restricted());
        assert!(rights.writable_unit_ids().contains(&unit));
    }
}
