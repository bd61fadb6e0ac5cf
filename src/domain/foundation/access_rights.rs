//! Unit-level access rights of the acting user.
//!
//! Users holding `unit_access_restriction` may only touch the units listed in
//! their token, unless they also hold `read_write_all_units`. Every check also
//! enforces the client boundary.

use std::collections::HashSet;

use super::{ClientId, ClientOwned, OwningUnit, UnitId, UserId, VeoError};

pub const UNIT_ACCESS_RESTRICTION: &str = "unit_access_restriction";
pub const READ_WRITE_ALL_UNITS: &str = "read_write_all_units";
pub const UNIT_CREATE: &str = "unit:create";
pub const UNIT_DELETE: &str = "unit:delete";
pub const UNIT_UPDATE: &str = "unit:update";

/// What the acting user may read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccessRights {
    username: UserId,
    client_id: Option<ClientId>,
    roles: Vec<String>,
    readable_unit_ids: HashSet<UnitId>,
    writable_unit_ids: HashSet<UnitId>,
}

impl UserAccessRights {
    pub fn new(
        username: UserId,
        client_id: Option<ClientId>,
        roles: Vec<String>,
        readable_unit_ids: HashSet<UnitId>,
        writable_unit_ids: HashSet<UnitId>,
    ) -> Self {
        Self {
            username,
            client_id,
            roles,
            readable_unit_ids,
            writable_unit_ids,
        }
    }

    /// Unrestricted rights used by background jobs acting on a client.
    pub fn system(client_id: ClientId) -> Self {
        Self::new(
            UserId::system(),
            Some(client_id),
            vec![READ_WRITE_ALL_UNITS.to_string()],
            HashSet::new(),
            HashSet::new(),
        )
    }

    /// Rights of a caller without a client; every client check fails.
    pub fn anonymous() -> Self {
        Self::new(
            UserId::system(),
            None,
            Vec::new(),
            HashSet::new(),
            HashSet::new(),
        )
    }

    pub fn username(&self) -> &UserId {
        &self.username
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn readable_unit_ids(&self) -> &HashSet<UnitId> {
        &self.readable_unit_ids
    }

    pub fn writable_unit_ids(&self) -> &HashSet<UnitId> {
        &self.writable_unit_ids
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Client id, or `AuthenticationRequired` for anonymous callers.
    pub fn require_client_id(&self) -> Result<ClientId, VeoError> {
        self.client_id.ok_or(VeoError::AuthenticationRequired)
    }

    pub fn is_unit_access_restricted(&self) -> bool {
        if self.has_role(READ_WRITE_ALL_UNITS) {
            return false;
        }
        self.has_role(UNIT_ACCESS_RESTRICTION)
    }

    fn require_unit_permission(&self, permission: &str) -> Result<(), VeoError> {
        if self.is_unit_access_restricted() && !self.has_role(permission) {
            return Err(VeoError::not_allowed(format!(
                "Missing {} permission.",
                permission
            )));
        }
        Ok(())
    }

    pub fn check_unit_create_allowed(&self) -> Result<(), VeoError> {
        self.require_unit_permission(UNIT_CREATE)
    }

    pub fn check_unit_delete_allowed(&self) -> Result<(), VeoError> {
        self.require_unit_permission(UNIT_DELETE)
    }

    pub fn check_unit_update_allowed(&self) -> Result<(), VeoError> {
        self.require_unit_permission(UNIT_UPDATE)
    }

    /// Write check for a new element that will be owned by `owner`.
    pub fn check_create_element_write_access(&self, owner: UnitId) -> Result<(), VeoError> {
        if self.is_unit_access_restricted() && !self.writable_unit_ids.contains(&owner) {
            return Err(VeoError::not_allowed(format!(
                "Missing unit '{}' write permission.",
                owner
            )));
        }
        Ok(())
    }

    /// Write check for an existing element owned by `unit`.
    pub fn check_element_write_access(&self, unit: &impl OwningUnit) -> Result<(), VeoError> {
        self.check_client(unit)?;
        if self.is_unit_access_restricted() && !self.writable_unit_ids.contains(&unit.unit_id()) {
            return Err(VeoError::not_allowed(format!(
                "Missing unit '{}' write permission.",
                unit.unit_name()
            )));
        }
        Ok(())
    }

    /// Read check for content of `unit`. Writable units are readable.
    pub fn check_element_read_access(&self, unit: &impl OwningUnit) -> Result<(), VeoError> {
        self.check_client(unit)?;
        let id = unit.unit_id();
        if self.is_unit_access_restricted()
            && !self.readable_unit_ids.contains(&id)
            && !self.writable_unit_ids.contains(&id)
        {
            return Err(VeoError::not_allowed(format!(
                "Missing unit '{}' read permission.",
                unit.unit_name()
            )));
        }
        Ok(())
    }

    /// Fails with `ClientBoundaryViolation` when `resource` belongs to another client.
    pub fn check_client(&self, resource: &impl ClientOwned) -> Result<(), VeoError> {
        let Some(owner) = resource.owning_client() else {
            return Ok(());
        };
        match self.client_id {
            Some(client_id) if client_id == owner => Ok(()),
            Some(client_id) => Err(VeoError::client_boundary(resource.resource_id(), client_id)),
            None => Err(VeoError::client_boundary(resource.resource_id(), "<anonymous>")),
        }
    }
}
