//! Keeps control and requirement implementations consistent with the
//! composition of controls.
//!
//! Implementing a composite control implies implementing each of its parts,
//! recursively. When parts are added to or removed from a control, every
//! element implementing that control (or one of its composites) is
//! updated.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::domain::element::Element;
use crate::domain::foundation::{ElementId, ElementType, UserId, VeoError};
use crate::ports::ElementRepository;

use super::ControlImplementationInput;

pub struct ControlImplementationService {
    elements: Arc<dyn ElementRepository>,
}

impl ControlImplementationService {
    pub fn new(elements: Arc<dyn ElementRepository>) -> Self {
        Self { elements }
    }

    /// Makes the control implementations of `element` match `requested`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if a control does not exist
    /// - `ClientBoundaryViolation` if a control belongs to another client
    /// - `Unprocessable` if a responsible is not a person of the client
    pub async fn apply(
        &self,
        element: &mut Element,
        requested: &[ControlImplementationInput],
    ) -> Result<(), VeoError> {
        let wanted: BTreeSet<ElementId> = requested.iter().map(|r| r.control).collect();
        let current: Vec<ElementId> = element
            .control_implementations()
            .iter()
            .map(|ci| ci.control)
            .collect();
        for control in current.iter().filter(|c| !wanted.contains(c)) {
            element.remove_control_implementation(control);
        }
        if requested.is_empty() {
            return Ok(());
        }

        let graph = self.load_with_parts(wanted).await?;
        let responsibles: BTreeSet<ElementId> =
            requested.iter().filter_map(|r| r.responsible).collect();
        let people: HashMap<ElementId, Element> = self
            .elements
            .find_by_ids(&responsibles)
            .await?
            .into_iter()
            .map(|e| (e.id(), e))
            .collect();

        for input in requested {
            let control = graph
                .get(&input.control)
                .ok_or_else(|| VeoError::not_found("Control", input.control))?;
            if control.client_id() != element.client_id() {
                return Err(VeoError::client_boundary(control.id(), element.client_id()));
            }
            if let Some(responsible) = input.responsible {
                check_responsible(people.get(&responsible), responsible, element)?;
            }
            element.implement_control(control, &graph)?;
            if let Some(ci) = element.control_implementation_mut(&input.control) {
                ci.description = input.description.clone();
                ci.responsible = input.responsible;
            }
        }
        Ok(())
    }

    /// Propagates a change of the parts of `control` to every element that
    /// implements it or one of its composites. `control` must already be
    /// stored with its new parts.
    ///
    /// Returns the updated elements.
    pub async fn parts_changed(
        &self,
        control: &Element,
        added: &BTreeSet<ElementId>,
        removed: &BTreeSet<ElementId>,
        user: &UserId,
    ) -> Result<Vec<Element>, VeoError> {
        if control.element_type() != ElementType::Control || (added.is_empty() && removed.is_empty())
        {
            return Ok(Vec::new());
        }

        let composites = self.composites_of(control.id()).await?;
        let added_graph = self.load_with_parts(added.clone()).await?;
        let added_requirements = requirements_of(added, &added_graph);
        let removed_graph = self.load_with_parts(removed.clone()).await?;
        let removed_requirements = requirements_of(removed, &removed_graph);

        let mut implementers: HashMap<ElementId, Element> = HashMap::new();
        for composite in &composites {
            for candidate in self.elements.find_referencing(composite).await? {
                if candidate.control_implementation(composite).is_some() {
                    implementers.entry(candidate.id()).or_insert(candidate);
                }
            }
        }

        let mut updated = Vec::new();
        for mut implementer in implementers.into_values() {
            let mut changed = false;
            for requirement in &added_requirements {
                changed |= implementer.add_requirement_to_implementations(&composites, *requirement);
            }
            if !removed_requirements.is_empty() {
                let still_required = self.required_controls(&implementer).await?;
                for requirement in removed_requirements.difference(&still_required) {
                    changed |= implementer.remove_requirement(requirement);
                }
            }
            if changed {
                implementer.touch(user);
                self.elements.update(&implementer).await?;
                updated.push(implementer);
            }
        }
        debug!(
            control_id = %control.id(),
            updated = updated.len(),
            "Propagated control part changes"
        );
        Ok(updated)
    }

    /// `id` and every control containing it, transitively.
    async fn composites_of(&self, id: ElementId) -> Result<BTreeSet<ElementId>, VeoError> {
        let mut composites = BTreeSet::from([id]);
        let mut frontier = vec![id];
        while let Some(next) = frontier.pop() {
            for composite in self.elements.find_composites_of(&next).await? {
                if composites.insert(composite.id()) {
                    frontier.push(composite.id());
                }
            }
        }
        Ok(composites)
    }

    /// Controls `element` must keep requirement implementations for.
    async fn required_controls(&self, element: &Element) -> Result<BTreeSet<ElementId>, VeoError> {
        let implemented: BTreeSet<ElementId> = element
            .control_implementations()
            .iter()
            .map(|ci| ci.control)
            .collect();
        let graph = self.load_with_parts(implemented.clone()).await?;
        Ok(requirements_of(&implemented, &graph))
    }

    /// Loads `roots` and all of their parts, transitively. Missing ids are
    /// skipped.
    async fn load_with_parts(
        &self,
        roots: BTreeSet<ElementId>,
    ) -> Result<HashMap<ElementId, Element>, VeoError> {
        let mut loaded: HashMap<ElementId, Element> = HashMap::new();
        let mut pending = roots;
        while !pending.is_empty() {
            let found = self.elements.find_by_ids(&pending).await?;
            let mut next = BTreeSet::new();
            for element in found {
                next.extend(element.parts().iter().copied());
                loaded.insert(element.id(), element);
            }
            next.retain(|id| !loaded.contains_key(id));
            pending = next;
        }
        Ok(loaded)
    }
}

/// `roots` plus their parts, recursively.
fn requirements_of(
    roots: &BTreeSet<ElementId>,
    graph: &HashMap<ElementId, Element>,
) -> BTreeSet<ElementId> {
    let mut all = roots.clone();
    for root in roots {
        if let Some(control) = graph.get(root) {
            all.extend(control.parts_recursively(graph, false));
        }
    }
    all
}

pub(crate) fn check_responsible(
    person: Option<&Element>,
    id: ElementId,
    element: &Element,
) -> Result<(), VeoError> {
    match person {
        Some(p) if p.element_type() == ElementType::Person && p.client_id() == element.client_id() => {
            Ok(())
        }
        Some(_) => Err(VeoError::unprocessable(format!(
            "Responsible {} must be a person of the same client",
            id
        ))),
        None => Err(VeoError::not_found("Person", id)),
    }
}
