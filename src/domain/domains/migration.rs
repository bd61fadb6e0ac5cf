//! Moving elements from an old domain version to its successor.

use tracing::debug;

use crate::domain::decision::Decider;
use crate::domain::element::{Element, ElementResolver};
use crate::domain::foundation::{DomainError, DomainId, ElementId, ErrorCode};

use super::{prune_attributes, Domain, LinkDefinition};

/// What happened to an element's association during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMigration {
    /// The association now points at the new domain.
    Transferred,
    /// The new domain no longer defines the element's sub type, so the
    /// element left the domain.
    RemovedFromDomain,
}

/// Transfers `element` from `old` to `new` and fits its domain-specific
/// data to the definitions of `new`.
///
/// - an undefined sub type removes the element from the domain
/// - an undefined status falls back to the sub type's first status
/// - undefined custom aspects and link types are dropped, as are
///   attributes whose values `new` no longer accepts
/// - links whose target no longer has the required type or sub type are
///   dropped; targets `resolver` does not know are kept
/// - decision results are recomputed against `new`
///
/// # Errors
///
/// - `Unprocessable` if the element is not associated with `old`, is already
///   associated with `new`, or its sub type defines no statuses
pub fn migrate_element(
    element: &mut Element,
    old: &Domain,
    new: &Domain,
    resolver: &dyn ElementResolver,
) -> Result<ElementMigration, DomainError> {
    element.transfer_to_domain(old.id(), new.id())?;
    let element_id = element.id();
    let element_type = element.element_type();

    let Some(definition) = new.element_type_definition(element_type) else {
        debug!(element_id = %element_id, "Element type is obsolete, removing element from domain");
        element.remove_from_domain(&new.id());
        return Ok(ElementMigration::RemovedFromDomain);
    };
    let Some(association) = element.association_mut(&new.id()) else {
        return Ok(ElementMigration::RemovedFromDomain);
    };
    let Some(sub_type) = definition.sub_type(&association.sub_type) else {
        debug!(
            element_id = %element_id,
            sub_type = %association.sub_type,
            "Sub type is obsolete, removing element from domain"
        );
        element.remove_from_domain(&new.id());
        return Ok(ElementMigration::RemovedFromDomain);
    };

    if !sub_type.statuses.contains(&association.status) {
        let fallback = sub_type.statuses.first().ok_or_else(|| {
            DomainError::new(
                ErrorCode::Unprocessable,
                format!(
                    "Sub type '{}' has no statuses in domain {}",
                    association.sub_type,
                    new.name()
                ),
            )
        })?;
        debug!(
            element_id = %element_id,
            status = %association.status,
            fallback = %fallback,
            "Replacing obsolete status"
        );
        association.status = fallback.clone();
    }

    association.custom_aspects.retain(|aspect, attributes| {
        match definition.custom_aspect(aspect) {
            Some(aspect_definition) => {
                let removed = prune_attributes(&aspect_definition.attribute_definitions, attributes);
                if !removed.is_empty() {
                    debug!(element_id = %element_id, aspect = %aspect, removed = ?removed, "Removed invalid attributes");
                }
                true
            }
            None => false,
        }
    });

    association.links.retain(|link_type, links| {
        let Some(link_definition) = definition.link(link_type) else {
            return false;
        };
        links.retain(|link| valid_target(resolver, link_definition, &link.target, old.id(), new.id()));
        for link in links.iter_mut() {
            prune_attributes(&link_definition.attribute_definitions, &mut link.attributes);
        }
        !links.is_empty()
    });

    let results = Decider::decide(element, new, resolver);
    element.set_decision_results(&new.id(), results);
    Ok(ElementMigration::Transferred)
}

/// Checks the link target's type and its sub type in either domain
/// version. Unknown targets pass.
fn valid_target(
    resolver: &dyn ElementResolver,
    definition: &LinkDefinition,
    target: &ElementId,
    old: DomainId,
    new: DomainId,
) -> bool {
    let Some(target) = resolver.resolve(target) else {
        return true;
    };
    if target.element_type() != definition.target_type {
        return false;
    }
    match &definition.target_sub_type {
        None => true,
        Some(required) => {
            let actual = target.sub_type(&new).or_else(|| target.sub_type(&old));
            actual == Some(required.as_str())
        }
    }
}
