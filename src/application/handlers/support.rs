//! Helpers shared by the use case handlers.

use std::sync::Arc;

use crate::domain::foundation::{
    etag, CommandMetadata, ElementId, EventEnvelope, UnitId, VeoError, CONTENT_CREATOR_ROLE,
};
use crate::domain::element::Element;
use crate::domain::unit::Unit;
use crate::ports::{ElementRepository, EventPublisher, UnitRepository};

/// Salt for ETag computation, shared by all handlers of one process.
#[derive(Clone)]
pub struct ETagSalt(Arc<str>);

impl ETagSalt {
    pub fn new(salt: impl AsRef<str>) -> Self {
        Self(Arc::from(salt.as_ref()))
    }

    pub fn etag(&self, id: &impl ToString, version: i64) -> String {
        etag::etag(id, version, &self.0)
    }

    /// # Errors
    ///
    /// - `ETagMismatch` if `if_match` does not name the current version
    pub fn check(&self, if_match: &str, id: &impl ToString, version: i64) -> Result<(), VeoError> {
        if etag::etag_matches(if_match, id, version, &self.0) {
            Ok(())
        } else {
            Err(VeoError::ETagMismatch { id: id.to_string() })
        }
    }
}

impl std::fmt::Debug for ETagSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ETagSalt(..)")
    }
}

pub(crate) fn require_admin(metadata: &CommandMetadata) -> Result<(), VeoError> {
    if metadata.is_admin() {
        Ok(())
    } else {
        Err(VeoError::MissingAdminPrivileges)
    }
}

/// Domain authoring is open to content creators and admins.
pub(crate) fn require_content_creator(metadata: &CommandMetadata) -> Result<(), VeoError> {
    if metadata.is_admin() || metadata.rights().has_role(CONTENT_CREATOR_ROLE) {
        Ok(())
    } else {
        Err(VeoError::not_allowed("Content creator role required."))
    }
}

pub(crate) async fn load_unit(units: &dyn UnitRepository, id: &UnitId) -> Result<Unit, VeoError> {
    units
        .find_by_id(id)
        .await?
        .ok_or_else(|| VeoError::not_found("Unit", id))
}

pub(crate) async fn load_element(
    elements: &dyn ElementRepository,
    id: &ElementId,
) -> Result<Element, VeoError> {
    elements
        .find_by_id(id)
        .await?
        .ok_or_else(|| VeoError::not_found("Element", id))
}

/// Stamps and publishes the envelopes of `events`.
pub(crate) async fn publish(
    publisher: &dyn EventPublisher,
    metadata: &CommandMetadata,
    envelopes: Vec<EventEnvelope>,
) -> Result<(), VeoError> {
    if envelopes.is_empty() {
        return Ok(());
    }
    let stamped = envelopes.into_iter().map(|e| metadata.stamp(e)).collect();
    publisher.publish_all(stamped).await?;
    Ok(())
}
