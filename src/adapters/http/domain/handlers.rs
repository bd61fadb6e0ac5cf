//! HTTP handlers for domain endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::{parse_id, with_etag};
use crate::adapters::http::middleware::{command_metadata, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::domain::{
    ContentSaved, CreateDomainCommand, DomainContentChange, UpdateDomainContentCommand,
};
use crate::application::handlers::element::{EvaluateElementCommand, EvaluationTarget};
use crate::application::{
    ElementStatusCountQuery, GetDomainQuery, GetElementSchemaQuery, MigrateDomainCommand,
};
use crate::domain::decision::Decision;
use crate::domain::domains::{ElementTypeDefinition, RiskDefinition};
use crate::domain::foundation::{AuthenticatedUser, DomainId, ElementType, VeoError};
use crate::domain::inspection::Inspection;

use super::dto::{
    ContentResponse, CreateDomainRequest, EvaluationParams, MigrationResponse, StatusCountParams,
};

/// GET /api/domains
pub async fn list_domains(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let domains = state
        .list_domains_handler()
        .handle(command_metadata(&user, &headers))
        .await?;
    Ok(Json(domains))
}

/// GET /api/domains/:id
pub async fn get_domain(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(domain_id): Path<String>,
) -> Result<Response, ApiError> {
    let domain_id: DomainId = parse_id(&domain_id, "domain")?;
    let domain = state
        .get_domain_handler()
        .handle(GetDomainQuery { domain_id }, command_metadata(&user, &headers))
        .await?;
    let etag = state.salt.etag(&domain.id(), domain.version());
    Ok(with_etag(StatusCode::OK, &etag, domain))
}

/// GET /api/domains/:id/element-status-count?unit=<id>
pub async fn element_status_count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(domain_id): Path<String>,
    Query(params): Query<StatusCountParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ElementStatusCountQuery {
        domain_id: parse_id(&domain_id, "domain")?,
        unit_id: parse_id(&params.unit, "unit")?,
    };
    let counts = state
        .element_status_count_handler()
        .handle(query, command_metadata(&user, &headers))
        .await?;
    Ok(Json(counts))
}

/// GET /api/domains/:id/:elementType/json-schema
pub async fn element_schema(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, element_type)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetElementSchemaQuery {
        domain_id: parse_id(&domain_id, "domain")?,
        element_type: parse_element_type(&element_type)?,
    };
    let schema = state
        .element_schema_handler()
        .handle(query, command_metadata(&user, &headers))
        .await?;
    Ok(Json(schema))
}

/// POST /api/domains/:id/evaluation
pub async fn evaluate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(domain_id): Path<String>,
    Query(params): Query<EvaluationParams>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let target = match (params.element, params.element_type, body) {
        (Some(element), _, _) => EvaluationTarget::Stored(parse_id(&element, "element")?),
        (None, Some(element_type), Some(Json(payload))) => EvaluationTarget::Transient {
            element_type: parse_element_type(&element_type)?,
            payload,
        },
        _ => {
            return Err(ApiError::bad_request(
                "Either an element id or an element type and body are required",
            ))
        }
    };
    let cmd = EvaluateElementCommand {
        domain_id: parse_id(&domain_id, "domain")?,
        target,
    };
    let result = state
        .evaluate_element_handler()
        .handle(cmd, command_metadata(&user, &headers))
        .await?;
    Ok(Json(result))
}

/// POST /api/domains/:id/migrate
pub async fn migrate_domain(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(domain_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = MigrateDomainCommand {
        domain_id: parse_id(&domain_id, "domain")?,
    };
    let outcome = state
        .migrate_domain_handler()
        .handle(cmd, command_metadata(&user, &headers))
        .await?;
    Ok(Json(MigrationResponse::from(outcome)))
}

/// POST /api/content-creation/domains
pub async fn create_domain(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(req): Json<CreateDomainRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateDomainCommand {
        name: req.name,
        abbreviation: req.abbreviation,
        description: req.description,
        authority: req.authority,
    };
    let metadata = command_metadata(&user, &headers);
    let domain = state
        .transaction(|state| async move { state.create_domain_handler().handle(cmd, metadata).await })
        .await?;
    let etag = state.salt.etag(&domain.id(), domain.version());
    Ok(with_etag(StatusCode::CREATED, &etag, ContentResponse::created_domain(domain.id())))
}

/// PUT /api/content-creation/domains/:id/element-type-definitions/:type
pub async fn put_element_type_definition(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, element_type)): Path<(String, String)>,
    Json(definition): Json<ElementTypeDefinition>,
) -> Result<Response, ApiError> {
    let change = DomainContentChange::ElementTypeDefinition {
        element_type: parse_element_type(&element_type)?,
        definition,
    };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Element type definition", saved))
}

/// PUT /api/content-creation/domains/:id/decisions/:key
pub async fn put_decision(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, key)): Path<(String, String)>,
    Json(decision): Json<Decision>,
) -> Result<Response, ApiError> {
    let change = DomainContentChange::SaveDecision { key, decision };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Decision", saved))
}

/// DELETE /api/content-creation/domains/:id/decisions/:key
pub async fn delete_decision(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let change = DomainContentChange::DeleteDecision { key };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Decision", saved))
}

/// PUT /api/content-creation/domains/:id/inspections/:key
pub async fn put_inspection(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, key)): Path<(String, String)>,
    Json(inspection): Json<Inspection>,
) -> Result<Response, ApiError> {
    let change = DomainContentChange::SaveInspection { key, inspection };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Inspection", saved))
}

/// DELETE /api/content-creation/domains/:id/inspections/:key
pub async fn delete_inspection(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let change = DomainContentChange::DeleteInspection { key };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Inspection", saved))
}

/// PUT /api/content-customizing/domains/:id/risk-definitions/:risk_definition
///
/// The path names the risk definition; an id in the body is overwritten.
pub async fn put_risk_definition(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((domain_id, risk_definition_id)): Path<(String, String)>,
    Json(mut definition): Json<RiskDefinition>,
) -> Result<Response, ApiError> {
    definition.id = risk_definition_id;
    let change = DomainContentChange::SaveRiskDefinition { definition };
    let saved = update_content(&state, &user, &headers, &domain_id, change).await?;
    Ok(content_response("Risk definition", saved))
}

async fn update_content(
    state: &AppState,
    user: &AuthenticatedUser,
    headers: &HeaderMap,
    domain_id: &str,
    change: DomainContentChange,
) -> Result<ContentSaved, ApiError> {
    let cmd = UpdateDomainContentCommand {
        domain_id: parse_id(domain_id, "domain")?,
        change,
    };
    let metadata = command_metadata(user, headers);
    let saved = state
        .transaction(|state| async move {
            state.update_domain_content_handler().handle(cmd, metadata).await
        })
        .await?;
    Ok(saved)
}

fn content_response(what: &str, saved: ContentSaved) -> Response {
    let status = match saved {
        ContentSaved::Created => StatusCode::CREATED,
        ContentSaved::Replaced | ContentSaved::Removed => StatusCode::OK,
    };
    (status, Json(ContentResponse::saved(what, saved))).into_response()
}

pub(crate) fn parse_element_type(raw: &str) -> Result<ElementType, ApiError> {
    ElementType::from_term(raw).map_err(|e| ApiError::from(VeoError::from(e)))
}
