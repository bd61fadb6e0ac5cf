//! Ownership traits for client-owned resources.
//!
//! Units, domains, and elements all belong to exactly one client. Access
//! checks never cross that boundary.

use super::{ClientId, UnitId};

/// Resource that belongs to a client.
pub trait ClientOwned {
    /// Client owning this resource, if it has been attached to one yet.
    fn owning_client(&self) -> Option<ClientId>;

    /// Identifier used in boundary violation messages.
    fn resource_id(&self) -> String;

    /// Returns `true` if the resource belongs to `client_id` or is unowned.
    fn is_owned_by(&self, client_id: &ClientId) -> bool {
        self.owning_client().map_or(true, |owner| &owner == client_id)
    }
}

/// Unit that elements are written into.
///
/// Write checks need the unit's identity and name in addition to its client.
pub trait OwningUnit: ClientOwned {
    fn unit_id(&self) -> UnitId;

    fn unit_name(&self) -> &str;
}
