//! Domain-specific data of an element.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::decision::DecisionResult;
use crate::domain::foundation::ElementId;

/// Attribute values of a custom aspect, keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Directed, typed link from an element to another element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLink {
    pub target: ElementId,
    #[serde(default)]
    pub attributes: Attributes,
}

impl CustomLink {
    pub fn new(target: ElementId) -> Self {
        Self {
            target,
            attributes: Map::new(),
        }
    }
}

/// Everything an element carries for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAssociation {
    pub sub_type: String,
    pub status: String,
    #[serde(default)]
    pub custom_aspects: BTreeMap<String, Attributes>,
    #[serde(default)]
    pub links: BTreeMap<String, Vec<CustomLink>>,
    /// Stored decision results, keyed by decision key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decision_results: BTreeMap<String, DecisionResult>,
}

impl DomainAssociation {
    pub fn new(sub_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            sub_type: sub_type.into(),
            status: status.into(),
            custom_aspects: BTreeMap::new(),
            links: BTreeMap::new(),
            decision_results: BTreeMap::new(),
        }
    }

    pub fn with_custom_aspect(mut self, aspect_type: impl Into<String>, attributes: Attributes) -> Self {
        self.custom_aspects.insert(aspect_type.into(), attributes);
        self
    }

    pub fn with_link(mut self, link_type: impl Into<String>, link: CustomLink) -> Self {
        self.links.entry(link_type.into()).or_default().push(link);
        self
    }

    /// All link targets, regardless of type.
    pub fn link_targets(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.links.values().flatten().map(|l| l.target)
    }

    /// Removes every link pointing at `target`. Returns `true` if any was removed.
    pub fn remove_links_to(&mut self, target: ElementId) -> bool {
        let mut removed = false;
        for links in self.links.values_mut() {
            let before = links.len();
            links.retain(|l| l.target != target);
            removed |= links.len() != before;
        }
        self.links.retain(|_, links| !links.is_empty());
        removed
    }
}
