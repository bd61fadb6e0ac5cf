//! Error types for the domain layer.
//!
//! `DomainError` is the code-carrying error crossing port boundaries.
//! `VeoError` is what use cases return; the HTTP layer maps it to status
//! codes.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must not exceed {max} characters, got {actual}")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation
    ValidationFailed,
    Unprocessable,

    // Lookup
    NotFound,
    AlreadyExists,

    // State
    IllegalStateTransition,
    ETagMismatch,
    MigrationFailed,

    // Authorization
    AuthenticationRequired,
    NotAllowed,
    MissingAdminPrivileges,
    ClientBoundaryViolation,

    // Infrastructure
    DatabaseError,
    CacheError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unprocessable => "UNPROCESSABLE_DATA",
            ErrorCode::NotFound => "ELEMENT_NOT_FOUND",
            ErrorCode::AlreadyExists => "ELEMENT_EXISTS",
            ErrorCode::IllegalStateTransition => "ILLEGAL_STATE_TRANSITION",
            ErrorCode::ETagMismatch => "ETAG_MISMATCH",
            ErrorCode::MigrationFailed => "MIGRATION_FAILED",
            ErrorCode::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            ErrorCode::NotAllowed => "NOT_ALLOWED",
            ErrorCode::MissingAdminPrivileges => "MISSING_ADMIN_PRIVILEGES",
            ErrorCode::ClientBoundaryViolation => "CLIENT_BOUNDARY_VIOLATION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InternalError => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Substitutes `%key%` placeholders in the message.
    pub fn with_param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.message = self.message.replace(&format!("%{}%", key), &value.to_string());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::validation(err.field().to_string(), err.to_string())
    }
}

/// Error returned by every use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VeoError {
    /// Referenced entity does not exist (or is invisible to the caller).
    NotFound { entity: &'static str, id: String },
    /// Entity exists but cannot be used, e.g. an inactive domain.
    Unavailable(String),
    /// Entity with this identity already exists.
    AlreadyExists { entity: &'static str, id: String },
    /// Caller lacks a permission.
    NotAllowed(String),
    /// Operation requires the `veo-admin` role.
    MissingAdminPrivileges,
    /// Entity belongs to a different client than the caller.
    ClientBoundaryViolation { entity_id: String, client_id: String },
    /// Request is well-formed but semantically invalid.
    Unprocessable(String),
    /// `If-Match` header does not match the current version.
    ETagMismatch { id: String },
    /// Input failed validation.
    ValidationFailed { field: String, message: String },
    /// Entity lifecycle does not allow the requested change.
    IllegalStateTransition(String),
    /// Domain migration finished with failing units.
    MigrationFailed { total: usize, failures: usize },
    /// No credentials were presented.
    AuthenticationRequired,
    /// Persistence, messaging, or other infrastructure failure.
    Infrastructure(String),
}

impl VeoError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        VeoError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        VeoError::Unavailable(message.into())
    }

    /// Rejection of any use of a deactivated domain.
    pub fn inactive_domain() -> Self {
        VeoError::Unavailable("Domain is inactive.".to_string())
    }

    pub fn already_exists(entity: &'static str, id: impl fmt::Display) -> Self {
        VeoError::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        VeoError::NotAllowed(message.into())
    }

    pub fn client_boundary(entity_id: impl fmt::Display, client_id: impl fmt::Display) -> Self {
        VeoError::ClientBoundaryViolation {
            entity_id: entity_id.to_string(),
            client_id: client_id.to_string(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        VeoError::Unprocessable(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VeoError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        VeoError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            VeoError::NotFound { .. } | VeoError::Unavailable(_) => ErrorCode::NotFound,
            VeoError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            VeoError::NotAllowed(_) => ErrorCode::NotAllowed,
            VeoError::MissingAdminPrivileges => ErrorCode::MissingAdminPrivileges,
            VeoError::ClientBoundaryViolation { .. } => ErrorCode::ClientBoundaryViolation,
            VeoError::Unprocessable(_) => ErrorCode::Unprocessable,
            VeoError::ETagMismatch { .. } => ErrorCode::ETagMismatch,
            VeoError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            VeoError::IllegalStateTransition(_) => ErrorCode::IllegalStateTransition,
            VeoError::MigrationFailed { .. } => ErrorCode::MigrationFailed,
            VeoError::AuthenticationRequired => ErrorCode::AuthenticationRequired,
            VeoError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            VeoError::NotFound { entity, id } => format!("{} {} not found", entity, id),
            VeoError::Unavailable(msg) => msg.clone(),
            VeoError::AlreadyExists { entity, id } => format!("{} {} already exists", entity, id),
            VeoError::NotAllowed(msg) => msg.clone(),
            VeoError::MissingAdminPrivileges => "Missing admin privileges.".to_string(),
            VeoError::ClientBoundaryViolation { entity_id, client_id } => format!(
                "The client boundary would be violated by the attempted operation on element: {} from client {}",
                entity_id, client_id
            ),
            VeoError::Unprocessable(msg) => msg.clone(),
            VeoError::ETagMismatch { id } => format!(
                "The eTag does not match for the element with the ID {}",
                id
            ),
            VeoError::ValidationFailed { field, message } => format!("{}: {}", field, message),
            VeoError::IllegalStateTransition(msg) => msg.clone(),
            VeoError::MigrationFailed { total, failures } => format!(
                "Migration failed for {} of {} unit(s)",
                failures, total
            ),
            VeoError::AuthenticationRequired => "Authentication required".to_string(),
            VeoError::Infrastructure(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for VeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl Error for VeoError {}

impl From<DomainError> for VeoError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => VeoError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::Unprocessable => VeoError::Unprocessable(err.message),
            ErrorCode::NotFound => VeoError::NotFound {
                entity: "Entity",
                id: err.details.get("id").cloned().unwrap_or_default(),
            },
            ErrorCode::AlreadyExists => VeoError::AlreadyExists {
                entity: "Entity",
                id: err.details.get("id").cloned().unwrap_or_default(),
            },
            ErrorCode::IllegalStateTransition => VeoError::IllegalStateTransition(err.message),
            ErrorCode::ETagMismatch => VeoError::ETagMismatch {
                id: err.details.get("id").cloned().unwrap_or_default(),
            },
            ErrorCode::NotAllowed => VeoError::NotAllowed(err.message),
            ErrorCode::MissingAdminPrivileges => VeoError::MissingAdminPrivileges,
            ErrorCode::AuthenticationRequired => VeoError::AuthenticationRequired,
            _ => VeoError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for VeoError {
    fn from(err: ValidationError) -> Self {
        VeoError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
