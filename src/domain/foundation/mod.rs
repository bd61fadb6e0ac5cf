//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, errors, events, access rights, and other value
//! objects used by every other domain module.

mod access_rights;
mod auth;
mod command;
mod element_type;
pub mod etag;
mod errors;
mod events;
mod ids;
mod ownership;
mod state_machine;
mod timestamp;
mod translation;

pub use access_rights::{
    UserAccessRights, READ_WRITE_ALL_UNITS, UNIT_ACCESS_RESTRICTION, UNIT_CREATE, UNIT_DELETE,
    UNIT_UPDATE,
};
pub use auth::{AuthError, AuthenticatedUser, ADMIN_ROLE, CLIENT_GROUP_PREFIX, CONTENT_CREATOR_ROLE};
pub use command::CommandMetadata;
pub use element_type::ElementType;
pub use errors::{DomainError, ErrorCode, ValidationError, VeoError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use ids::{
    ClientId, ControlImplementationId, DomainId, ElementId, RequirementImplementationId, UnitId,
    UserId,
};
pub use ownership::{ClientOwned, OwningUnit};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use translation::TranslatedText;
