//! Domain use cases.

mod create_domain;
mod element_status_count;
mod get_domain;
mod get_element_schema;
mod list_domains;
mod migrate_domain;
mod update_domain_content;

pub use create_domain::{CreateDomainCommand, CreateDomainHandler, BLANK_DOMAIN_VERSION};
pub use element_status_count::{ElementStatusCount, ElementStatusCountHandler, ElementStatusCountQuery};
pub use get_domain::{GetDomainHandler, GetDomainQuery};
pub use get_element_schema::{GetElementSchemaHandler, GetElementSchemaQuery};
pub use list_domains::ListDomainsHandler;
pub use migrate_domain::{MigrateDomainCommand, MigrateDomainHandler, MigrationOutcome};
pub use update_domain_content::{
    ContentSaved, DomainContentChange, UpdateDomainContentCommand, UpdateDomainContentHandler,
};

use crate::domain::domains::Domain;
use crate::domain::foundation::{DomainId, UserAccessRights, VeoError};
use crate::ports::DomainRepository;

/// Loads a domain of the caller's client.
pub(crate) async fn load_domain(
    domains: &dyn DomainRepository,
    rights: &UserAccessRights,
    id: &DomainId,
) -> Result<Domain, VeoError> {
    let domain = domains
        .find_by_id(id)
        .await?
        .ok_or_else(|| VeoError::not_found("Domain", id))?;
    rights.check_client(&domain)?;
    Ok(domain)
}
