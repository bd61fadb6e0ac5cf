//! Validation of an element against the domains it is associated with.

use std::collections::HashMap;

use crate::domain::domains::{validate_attributes, Domain};
use crate::domain::foundation::{DomainError, DomainId, ElementType, ErrorCode};

use super::{DomainAssociation, Element, ElementResolver};

/// Checks sub types, statuses, custom aspects, links, parts, and risks of an
/// element against the definitions of its domains.
pub struct DomainSensitiveElementValidator<'a> {
    domains: &'a HashMap<DomainId, Domain>,
    resolver: &'a dyn ElementResolver,
}

impl<'a> DomainSensitiveElementValidator<'a> {
    pub fn new(domains: &'a HashMap<DomainId, Domain>, resolver: &'a dyn ElementResolver) -> Self {
        Self { domains, resolver }
    }

    /// # Errors
    ///
    /// - `Unprocessable` with the first violation found
    pub fn validate(&self, element: &Element) -> Result<(), DomainError> {
        for (domain_id, association) in element.domains() {
            let domain = self.domains.get(domain_id).ok_or_else(|| {
                unprocessable(format!("Domain {} is not available for this client", domain_id))
            })?;
            if !domain.is_active() {
                return Err(unprocessable(format!("Domain {} is inactive", domain_id)));
            }
            self.validate_sub_type(element, domain, association)?;
            self.validate_custom_aspects(element, domain, association)?;
            self.validate_links(element, domain, association)?;
        }
        self.validate_parts(element)?;
        self.validate_risks(element)?;
        Ok(())
    }

    fn validate_sub_type(
        &self,
        element: &Element,
        domain: &Domain,
        association: &DomainAssociation,
    ) -> Result<(), DomainError> {
        let definition = domain.element_type_definition(element.element_type());
        let sub_type = definition
            .and_then(|d| d.sub_type(&association.sub_type))
            .ok_or_else(|| {
                unprocessable(format!(
                    "Sub type '{}' is not defined for {} in domain {}",
                    association.sub_type,
                    element.element_type().plural_term(),
                    domain.name()
                ))
            })?;
        if !sub_type.statuses.iter().any(|s| s == &association.status) {
            return Err(unprocessable(format!(
                "Status '{}' is not allowed for sub type '{}'",
                association.status, association.sub_type
            )));
        }
        Ok(())
    }

    fn validate_custom_aspects(
        &self,
        element: &Element,
        domain: &Domain,
        association: &DomainAssociation,
    ) -> Result<(), DomainError> {
        let definition = domain.element_type_definition(element.element_type());
        for (aspect_type, attributes) in &association.custom_aspects {
            let aspect = definition
                .and_then(|d| d.custom_aspect(aspect_type))
                .ok_or_else(|| {
                    unprocessable(format!(
                        "Custom aspect type '{}' is not defined in any domain used by the element.",
                        aspect_type
                    ))
                })?;
            let errors = validate_attributes(&aspect.attribute_definitions, attributes);
            if !errors.is_empty() {
                return Err(unprocessable(format!(
                    "Invalid custom aspect '{}': {}",
                    aspect_type,
                    errors.join("; ")
                )));
            }
        }
        Ok(())
    }

    fn validate_links(
        &self,
        element: &Element,
        domain: &Domain,
        association: &DomainAssociation,
    ) -> Result<(), DomainError> {
        let definition = domain.element_type_definition(element.element_type());
        for (link_type, links) in &association.links {
            let link_definition = definition.and_then(|d| d.link(link_type)).ok_or_else(|| {
                unprocessable(format!(
                    "Link type '{}' is not defined for {} in domain {}",
                    link_type,
                    element.element_type().plural_term(),
                    domain.name()
                ))
            })?;
            for link in links {
                let target = self.resolver.resolve(&link.target).ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::NotFound,
                        format!("Link target {} not found", link.target),
                    )
                    .with_detail("id", link.target.to_string())
                })?;
                if target.element_type() != link_definition.target_type {
                    return Err(unprocessable(format!(
                        "Invalid target type '{}' for link type '{}'",
                        target.element_type(),
                        link_type
                    )));
                }
                if let Some(required) = &link_definition.target_sub_type {
                    let actual = target.sub_type(&domain.id());
                    if actual != Some(required.as_str()) {
                        return Err(unprocessable(format!(
                            "Expected target of link '{}' ('{}') to have sub type '{}' but found '{}'",
                            link_type,
                            target.name(),
                            required,
                            actual.unwrap_or("none")
                        )));
                    }
                }
                let errors = validate_attributes(&link_definition.attribute_definitions, &link.attributes);
                if !errors.is_empty() {
                    return Err(unprocessable(format!(
                        "Invalid link '{}': {}",
                        link_type,
                        errors.join("; ")
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_parts(&self, element: &Element) -> Result<(), DomainError> {
        for part_id in element.parts() {
            if let Some(part) = self.resolver.resolve(part_id) {
                if part.element_type() != element.element_type() {
                    return Err(unprocessable(format!(
                        "Parts of {} must be {} but {} is a {}",
                        element.element_type().plural_term(),
                        element.element_type().plural_term(),
                        part.id(),
                        part.element_type()
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_risks(&self, element: &Element) -> Result<(), DomainError> {
        for risk in element.risks() {
            if !element.is_associated_with(&risk.domain) {
                return Err(unprocessable(format!(
                    "Risk refers to domain {} which the element is not associated with",
                    risk.domain
                )));
            }
            let definition = self
                .domains
                .get(&risk.domain)
                .and_then(|d| d.risk_definition(&risk.risk_definition))
                .ok_or_else(|| {
                    unprocessable(format!("Unknown risk definition '{}'", risk.risk_definition))
                })?;
            risk.validate(definition)?;
            if let Some(scenario) = self.resolver.resolve(&risk.scenario) {
                if scenario.element_type() != ElementType::Scenario {
                    return Err(unprocessable(format!(
                        "Risk scenario {} is not a scenario",
                        risk.scenario
                    )));
                }
            }
        }
        Ok(())
    }
}

fn unprocessable(message: String) -> DomainError {
    DomainError::new(ErrorCode::Unprocessable, message)
}
