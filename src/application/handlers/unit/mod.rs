//! Unit use cases.

mod create_unit;
mod delete_unit;
mod get_unit;
mod list_units;
mod update_unit;

pub use create_unit::{CreateUnitCommand, CreateUnitHandler, CreateUnitResult};
pub use delete_unit::{DeleteUnitCommand, DeleteUnitHandler, DeleteUnitResult};
pub use get_unit::{GetUnitHandler, GetUnitQuery, GetUnitResult};
pub use list_units::{ListUnitsHandler, ListUnitsQuery};
pub use update_unit::{UpdateUnitCommand, UpdateUnitHandler, UpdateUnitResult};

use std::collections::BTreeSet;

use crate::domain::foundation::{ClientId, DomainId, VeoError};
use crate::ports::DomainRepository;

/// Checks that every requested domain is an active domain of the client.
pub(crate) async fn check_unit_domains(
    domains: &dyn DomainRepository,
    client_id: &ClientId,
    requested: &BTreeSet<DomainId>,
) -> Result<(), VeoError> {
    for id in requested {
        let domain = domains
            .find_by_id(id)
            .await?
            .ok_or_else(|| VeoError::not_found("Domain", id))?;
        if domain.client_id() != *client_id {
            return Err(VeoError::client_boundary(id, client_id));
        }
        if !domain.is_active() {
            return Err(VeoError::unprocessable(format!(
                "Domain {} is inactive and cannot be used by units.",
                domain.name()
            )));
        }
    }
    Ok(())
}
