//! Element aggregate.
//!
//! Elements are owned by a unit and customized per domain through a
//! `DomainAssociation`. Risk-affected elements (assets, processes, scopes)
//! also carry risks and control implementations.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::decision::DecisionResult;
use crate::domain::domains::Domain;
use crate::domain::foundation::{
    ClientId, ClientOwned, ControlImplementationId, DomainError, DomainId, ElementId, ElementType,
    ErrorCode, RequirementImplementationId, Timestamp, UnitId, UserId,
};

use super::{
    ControlImplementation, DomainAssociation, ElementRisk, RequirementImplementation,
};

/// Maximum length for element names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Looks up elements referenced by parts, members, links, or risks.
pub trait ElementResolver {
    fn resolve(&self, id: &ElementId) -> Option<&Element>;
}

impl ElementResolver for HashMap<ElementId, Element> {
    fn resolve(&self, id: &ElementId) -> Option<&Element> {
        self.get(id)
    }
}

/// Resolver that knows no elements.
pub struct NoElements;

impl ElementResolver for NoElements {
    fn resolve(&self, _id: &ElementId) -> Option<&Element> {
        None
    }
}

/// GRC element.
///
/// # Invariants
///
/// - `name` is 1-255 characters
/// - `parts` and `members` never contain the element itself
/// - `members` is only used by scopes, `parts` by every other type
/// - risks and control implementations only exist on risk-affected types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    id: ElementId,
    element_type: ElementType,
    owner: UnitId,
    client_id: ClientId,
    name: String,
    abbreviation: Option<String>,
    description: Option<String>,
    designator: String,
    parts: BTreeSet<ElementId>,
    members: BTreeSet<ElementId>,
    domains: BTreeMap<DomainId, DomainAssociation>,
    risks: Vec<ElementRisk>,
    control_implementations: Vec<ControlImplementation>,
    requirement_implementations: Vec<RequirementImplementation>,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
    created_by: String,
    updated_by: String,
}

impl Element {
    /// Create a new element without designator or domain associations.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if name is empty or too long
    pub fn new(
        id: ElementId,
        element_type: ElementType,
        owner: UnitId,
        client_id: ClientId,
        name: impl Into<String>,
        created_by: &UserId,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        Self::validate_name(&name)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            element_type,
            owner,
            client_id,
            name,
            abbreviation: None,
            description: None,
            designator: String::new(),
            parts: BTreeSet::new(),
            members: BTreeSet::new(),
            domains: BTreeMap::new(),
            risks: Vec::new(),
            control_implementations: Vec::new(),
            requirement_implementations: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            created_by: created_by.to_string(),
            updated_by: created_by.to_string(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn owner(&self) -> UnitId {
        self.owner
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn designator(&self) -> &str {
        &self.designator
    }

    /// `<designator> <abbreviation> <name>`, as shown in lists.
    pub fn display_name(&self) -> String {
        match &self.abbreviation {
            Some(abbreviation) => format!("{} {} {}", self.designator, abbreviation, self.name),
            None => format!("{} {}", self.designator, self.name),
        }
    }

    pub fn parts(&self) -> &BTreeSet<ElementId> {
        &self.parts
    }

    pub fn members(&self) -> &BTreeSet<ElementId> {
        &self.members
    }

    pub fn domains(&self) -> &BTreeMap<DomainId, DomainAssociation> {
        &self.domains
    }

    pub fn association(&self, domain: &DomainId) -> Option<&DomainAssociation> {
        self.domains.get(domain)
    }

    pub fn is_associated_with(&self, domain: &DomainId) -> bool {
        self.domains.contains_key(domain)
    }

    pub fn sub_type(&self, domain: &DomainId) -> Option<&str> {
        self.association(domain).map(|a| a.sub_type.as_str())
    }

    pub fn status(&self, domain: &DomainId) -> Option<&str> {
        self.association(domain).map(|a| a.status.as_str())
    }

    pub fn risks(&self) -> &[ElementRisk] {
        &self.risks
    }

    pub fn control_implementations(&self) -> &[ControlImplementation] {
        &self.control_implementations
    }

    pub fn requirement_implementations(&self) -> &[RequirementImplementation] {
        &self.requirement_implementations
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn updated_by(&self) -> &str {
        &self.updated_by
    }

    /// Every element this one points at through links.
    pub fn link_targets(&self) -> BTreeSet<ElementId> {
        self.domains
            .values()
            .flat_map(|a| a.link_targets())
            .collect()
    }

    /// Every element this one references: parts, members, link targets,
    /// risk scenarios, and implemented controls.
    pub fn referenced_elements(&self) -> BTreeSet<ElementId> {
        let mut refs = self.link_targets();
        refs.extend(self.parts.iter().copied());
        refs.extend(self.members.iter().copied());
        refs.extend(self.risks.iter().map(|r| r.scenario));
        refs.extend(self.control_implementations.iter().map(|ci| ci.control));
        refs.extend(self.control_implementations.iter().filter_map(|ci| ci.responsible));
        refs.extend(self.requirement_implementations.iter().filter_map(|ri| ri.responsible));
        refs
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Basic properties
    // ─────────────────────────────────────────────────────────────────────────

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_abbreviation(&mut self, abbreviation: Option<String>) {
        self.abbreviation = abbreviation.filter(|a| !a.trim().is_empty());
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
    }

    /// Moves the element to another unit of the same client.
    pub fn set_owner(&mut self, owner: UnitId) {
        self.owner = owner;
    }

    /// Assigns the designator `<prefix>-<number>`.
    pub fn assign_designator(&mut self, number: u64) {
        self.designator = format!("{}-{}", self.element_type.designator_prefix(), number);
    }

    /// Marks a modification by `user`, bumping the version.
    pub fn touch(&mut self, user: &UserId) {
        self.version += 1;
        self.updated_at = Timestamp::now();
        self.updated_by = user.to_string();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Domains
    // ─────────────────────────────────────────────────────────────────────────

    /// Associates with a domain, replacing any previous association.
    pub fn associate_with_domain(&mut self, domain: DomainId, association: DomainAssociation) {
        self.domains.insert(domain, association);
    }

    /// Replaces all associations. Risks of dropped domains are removed.
    pub fn set_domain_associations(&mut self, domains: BTreeMap<DomainId, DomainAssociation>) {
        self.risks.retain(|r| domains.contains_key(&r.domain));
        self.domains = domains;
    }

    pub fn association_mut(&mut self, domain: &DomainId) -> Option<&mut DomainAssociation> {
        self.domains.get_mut(domain)
    }

    /// Drops the association with `domain` along with its risks.
    pub fn remove_from_domain(&mut self, domain: &DomainId) -> bool {
        self.risks.retain(|r| &r.domain != domain);
        self.domains.remove(domain).is_some()
    }

    /// Moves the association (and risks) from `old` to `new`.
    ///
    /// # Errors
    ///
    /// - `Unprocessable` if the element is not associated with `old` or is
    ///   already associated with `new`
    pub fn transfer_to_domain(&mut self, old: DomainId, new: DomainId) -> Result<(), DomainError> {
        if self.domains.contains_key(&new) {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                format!("{} {} is already associated with domain {}", self.element_type, self.id, new),
            ));
        }
        let association = self.domains.remove(&old).ok_or_else(|| {
            DomainError::new(
                ErrorCode::Unprocessable,
                format!("{} {} is not associated with domain {}", self.element_type, self.id, old),
            )
        })?;
        self.domains.insert(new, association);
        for risk in self.risks.iter_mut().filter(|r| r.domain == old) {
            risk.domain = new;
        }
        Ok(())
    }

    /// Stores decision results for a domain, if associated.
    pub fn set_decision_results(
        &mut self,
        domain: &DomainId,
        results: BTreeMap<String, DecisionResult>,
    ) {
        if let Some(association) = self.domains.get_mut(domain) {
            association.decision_results = results;
        }
    }

    /// Removes every link pointing at `target`.
    pub fn remove_links_to(&mut self, target: ElementId) -> bool {
        let mut removed = false;
        for association in self.domains.values_mut() {
            removed |= association.remove_links_to(target);
        }
        removed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Composition
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces the parts. Returns `(added, removed)`.
    ///
    /// # Errors
    ///
    /// - `Unprocessable` for scopes or if the element would contain itself
    pub fn set_parts(
        &mut self,
        parts: BTreeSet<ElementId>,
    ) -> Result<(BTreeSet<ElementId>, BTreeSet<ElementId>), DomainError> {
        if !self.element_type.is_composite() && !parts.is_empty() {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                format!("{} cannot have parts", self.element_type.plural_term()),
            ));
        }
        if parts.contains(&self.id) {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                "An element cannot be a part of itself",
            ));
        }
        let added = parts.difference(&self.parts).copied().collect();
        let removed = self.parts.difference(&parts).copied().collect();
        self.parts = parts;
        Ok((added, removed))
    }

    /// Replaces the members of a scope.
    pub fn set_members(&mut self, members: BTreeSet<ElementId>) -> Result<(), DomainError> {
        if self.element_type != ElementType::Scope && !members.is_empty() {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                "Only scopes can have members",
            ));
        }
        if members.contains(&self.id) {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                "A scope cannot be a member of itself",
            ));
        }
        self.members = members;
        Ok(())
    }

    /// Drops `id` from parts and members. Returns `true` if anything changed.
    pub fn remove_child(&mut self, id: ElementId) -> bool {
        let removed_part = self.parts.remove(&id);
        let removed_member = self.members.remove(&id);
        removed_part || removed_member
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Risks
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_risks(&mut self, risks: Vec<ElementRisk>) -> Result<(), DomainError> {
        self.ensure_risk_affected()?;
        self.risks = risks;
        Ok(())
    }

    /// Highest residual risk ordinal of any risk in `domain`.
    pub fn max_risk(&self, domain: &Domain) -> Option<u32> {
        self.risks
            .iter()
            .filter(|r| r.domain == domain.id())
            .filter_map(|r| {
                domain
                    .risk_definition(&r.risk_definition)
                    .map(|def| r.determine(def))
            })
            .flatten()
            .filter_map(|d| d.residual_risk)
            .max()
    }

    /// Removes risks that refer to `scenario`.
    pub fn remove_risks_for(&mut self, scenario: ElementId) -> bool {
        let before = self.risks.len();
        self.risks.retain(|r| r.scenario != scenario);
        before != self.risks.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Compliance
    // ─────────────────────────────────────────────────────────────────────────

    pub fn control_implementation(&self, control: &ElementId) -> Option<&ControlImplementation> {
        self.control_implementations
            .iter()
            .find(|ci| &ci.control == control)
    }

    pub fn control_implementation_mut(
        &mut self,
        control: &ElementId,
    ) -> Option<&mut ControlImplementation> {
        self.control_implementations
            .iter_mut()
            .find(|ci| &ci.control == control)
    }

    pub fn requirement_implementation(&self, control: &ElementId) -> Option<&RequirementImplementation> {
        self.requirement_implementations
            .iter()
            .find(|ri| &ri.control == control)
    }

    pub fn requirement_implementation_mut(
        &mut self,
        control: &ElementId,
    ) -> Option<&mut RequirementImplementation> {
        self.requirement_implementations
            .iter_mut()
            .find(|ri| &ri.control == control)
    }

    /// Implements `control`, creating requirement implementations for it and
    /// all of its parts (recursively).
    ///
    /// Returns the existing implementation id if the control is already
    /// implemented.
    pub fn implement_control(
        &mut self,
        control: &Element,
        resolver: &dyn ElementResolver,
    ) -> Result<ControlImplementationId, DomainError> {
        self.ensure_risk_affected()?;
        if control.element_type != ElementType::Control {
            return Err(DomainError::new(
                ErrorCode::Unprocessable,
                format!("{} is not a control", control.id),
            ));
        }
        if let Some(existing) = self.control_implementation(&control.id) {
            return Ok(existing.id);
        }
        let mut ci = ControlImplementation::new(control.id);
        for requirement in control.parts_recursively(resolver, true) {
            let ri_id = self.ensure_requirement(requirement);
            ci.requirement_implementations.insert(ri_id);
        }
        let id = ci.id;
        self.control_implementations.push(ci);
        Ok(id)
    }

    /// Adds `requirement` to every control implementation whose control is
    /// one of `composites`.
    pub fn add_requirement_to_implementations(
        &mut self,
        composites: &BTreeSet<ElementId>,
        requirement: ElementId,
    ) -> bool {
        if !self
            .control_implementations
            .iter()
            .any(|ci| composites.contains(&ci.control))
        {
            return false;
        }
        let ri_id = self.ensure_requirement(requirement);
        let mut changed = false;
        for ci in self
            .control_implementations
            .iter_mut()
            .filter(|ci| composites.contains(&ci.control))
        {
            changed |= ci.requirement_implementations.insert(ri_id);
        }
        changed
    }

    /// Removes the implementation of `control` and prunes orphaned,
    /// unedited requirement implementations.
    pub fn remove_control_implementation(&mut self, control: &ElementId) -> bool {
        let before = self.control_implementations.len();
        self.control_implementations.retain(|ci| &ci.control != control);
        let removed = before != self.control_implementations.len();
        if removed {
            self.prune_requirements();
        }
        removed
    }

    /// Unsets `person` as responsible on every control and requirement
    /// implementation.
    pub fn clear_responsible(&mut self, person: &ElementId) -> bool {
        let mut changed = false;
        for ci in &mut self.control_implementations {
            if ci.responsible.as_ref() == Some(person) {
                ci.responsible = None;
                changed = true;
            }
        }
        for ri in &mut self.requirement_implementations {
            if ri.responsible.as_ref() == Some(person) {
                ri.responsible = None;
                changed = true;
            }
        }
        changed
    }

    /// Detaches the requirement implementation for `control` from every
    /// control implementation.
    pub fn remove_requirement(&mut self, control: &ElementId) -> bool {
        let Some(ri_id) = self.requirement_implementation(control).map(|ri| ri.id) else {
            return false;
        };
        let mut changed = false;
        for ci in &mut self.control_implementations {
            changed |= ci.requirement_implementations.remove(&ri_id);
        }
        self.prune_requirements();
        changed
    }

    fn ensure_requirement(&mut self, control: ElementId) -> RequirementImplementationId {
        if let Some(existing) = self.requirement_implementation(&control) {
            return existing.id;
        }
        let ri = RequirementImplementation::new(control);
        let id = ri.id;
        self.requirement_implementations.push(ri);
        id
    }

    fn prune_requirements(&mut self) {
        let referenced: HashSet<_> = self
            .control_implementations
            .iter()
            .flat_map(|ci| ci.requirement_implementations.iter().copied())
            .collect();
        self.requirement_implementations
            .retain(|ri| referenced.contains(&ri.id) || !ri.is_unedited());
    }

    /// This element's id (if `include_self`) plus all parts, recursively.
    ///
    /// Unresolvable parts are included but not descended into.
    pub fn parts_recursively(
        &self,
        resolver: &dyn ElementResolver,
        include_self: bool,
    ) -> BTreeSet<ElementId> {
        let mut result = BTreeSet::new();
        if include_self {
            result.insert(self.id);
        }
        let mut stack: Vec<ElementId> = self.parts.iter().copied().collect();
        while let Some(next) = stack.pop() {
            if next == self.id || !result.insert(next) {
                continue;
            }
            if let Some(part) = resolver.resolve(&next) {
                stack.extend(part.parts.iter().copied());
            }
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_risk_affected(&self) -> Result<(), DomainError> {
        if self.element_type.is_risk_affected() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::Unprocessable,
                format!("{} cannot carry risks or implement controls", self.element_type.plural_term()),
            ))
        }
    }

    fn validate_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "Name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(
                "name",
                format!("Name cannot exceed {} characters", MAX_NAME_LENGTH),
            ));
        }
        Ok(())
    }
}

impl ClientOwned for Element {
    fn owning_client(&self) -> Option<ClientId> {
        Some(self.client_id)
    }

    fn resource_id(&self) -> String {
        self.id.to_string()
    }
}
