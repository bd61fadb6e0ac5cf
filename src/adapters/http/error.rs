//! Error responses of the REST API.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::foundation::{ErrorCode, VeoError};

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Failure of an API call.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request the use case never saw (bad ids, missing headers).
    BadRequest(String),
    /// Error returned by a use case.
    Veo(VeoError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Veo(e) => status_of(e),
        }
    }
}

/// HTTP status for a use case error.
pub fn status_of(error: &VeoError) -> StatusCode {
    match error.code() {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        // Foreign ids are reported as missing.
        ErrorCode::NotFound | ErrorCode::ClientBoundaryViolation => StatusCode::NOT_FOUND,
        ErrorCode::AlreadyExists | ErrorCode::IllegalStateTransition => StatusCode::CONFLICT,
        ErrorCode::ETagMismatch => StatusCode::PRECONDITION_FAILED,
        ErrorCode::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        ErrorCode::NotAllowed | ErrorCode::MissingAdminPrivileges => StatusCode::FORBIDDEN,
        ErrorCode::MigrationFailed
        | ErrorCode::DatabaseError
        | ErrorCode::CacheError
        | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<VeoError> for ApiError {
    fn from(err: VeoError) -> Self {
        ApiError::Veo(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => ErrorResponse::new("BAD_REQUEST", message),
            ApiError::Veo(err) => {
                let mut body = ErrorResponse::new(err.code().to_string(), err.message());
                match &err {
                    VeoError::NotFound { entity, id } => {
                        body = body.with_detail("entity", *entity).with_detail("id", id);
                    }
                    VeoError::ValidationFailed { field, .. } if !field.is_empty() => {
                        body = body.with_detail("field", field);
                    }
                    VeoError::ClientBoundaryViolation { entity_id, .. } => {
                        // The foreign client stays hidden.
                        body = ErrorResponse::new(
                            ErrorCode::NotFound.to_string(),
                            format!("{} not found", entity_id),
                        );
                    }
                    VeoError::Infrastructure(msg) => {
                        tracing::error!(error = %msg, "Request failed on infrastructure");
                        body = ErrorResponse::new(err.code().to_string(), "Internal server error");
                    }
                    _ => {}
                }
                body
            }
        };
        (status, Json(body)).into_response()
    }
}
