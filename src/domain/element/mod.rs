//! Element module - assets, processes, controls, and the other GRC objects.

pub(crate) mod aggregate;
mod association;
mod compliance;
mod events;
mod risk;
mod validator;

pub use aggregate::{Element, ElementResolver, NoElements, MAX_NAME_LENGTH};
pub use association::{Attributes, CustomLink, DomainAssociation};
pub use compliance::{
    ControlImplementation, ControlImplementationPurpose, ImplementationStatus, Origination,
    RequirementImplementation,
};
pub use events::{
    ElementCreated, ElementDeleted, ElementUpdated, RiskAffectedLinkDeleted,
    RiskAffectingElementChanged, RiskChange,
};
pub use risk::{DeterminedRisk, ElementRisk};
pub use validator::DomainSensitiveElementValidator;
