//! HTTP handlers for element endpoints.

use std::collections::BTreeSet;
use std::str::FromStr;

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::adapters::http::domain::handlers::parse_element_type;
use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::{if_match, parse_id, with_etag};
use crate::adapters::http::middleware::{command_metadata, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::compliance::{
    GetControlImplementationsQuery, GetRequirementImplementationQuery,
    ListRequirementImplementationsQuery, UpdateRequirementImplementationCommand,
};
use crate::application::handlers::element::{
    CreateElementCommand, DeleteElementCommand, GetElementQuery, QueryElementsQuery,
    UpdateElementCommand,
};
use crate::domain::foundation::{AuthenticatedUser, DomainId, ElementId};
use crate::ports::ElementQuery;

use super::dto::{
    parse_purpose, ControlImplementationParams, ElementListParams, ElementResponse,
    RequirementImplementationRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Elements
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/elements
pub async fn list_elements(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Query(params): Query<ElementListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = QueryElementsQuery {
        filter: element_filter(&params)?,
        page: params.page_params().to_page_request(),
    };
    let page = state
        .query_elements_handler()
        .handle(query, command_metadata(&user, &headers))
        .await?;
    Ok(Json(page.map(|e| ElementResponse::from(&e))))
}

fn element_filter(params: &ElementListParams) -> Result<ElementQuery, ApiError> {
    let element_types = params
        .element_type
        .as_deref()
        .map(|raw| split(raw).map(parse_element_type).collect::<Result<BTreeSet<_>, _>>())
        .transpose()?;
    let units = params
        .unit
        .as_deref()
        .map(|raw| split(raw).map(|id| parse_id(id, "unit")).collect::<Result<BTreeSet<_>, _>>())
        .transpose()?;
    let ids = params
        .ids
        .as_deref()
        .map(|raw| split(raw).map(|id| parse_id(id, "element")).collect::<Result<BTreeSet<_>, _>>())
        .transpose()?;
    Ok(ElementQuery {
        units,
        element_types,
        domain: optional_id(params.domain.as_deref(), "domain")?,
        sub_type: params.sub_type.clone(),
        status: params.status.clone(),
        display_name: params.display_name.clone(),
        name: params.name.clone(),
        abbreviation: params.abbreviation.clone(),
        description: params.description.clone(),
        designator: params.designator.clone(),
        updated_by: params.updated_by.clone(),
        has_child_elements: params.has_child_elements,
        has_parent_elements: params.has_parent_elements,
        scope: optional_id(params.scope.as_deref(), "scope")?,
        ids,
        ..ElementQuery::default()
    })
}

fn split(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn optional_id<T: FromStr>(raw: Option<&str>, what: &str) -> Result<Option<T>, ApiError> {
    raw.map(|raw| parse_id(raw, what)).transpose()
}

/// POST /api/elements
///
/// The `type` property of the body selects the element type.
pub async fn create_element(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let element_type = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("The element type is required"))
        .and_then(parse_element_type)?;
    let cmd = CreateElementCommand { element_type, payload };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move { state.create_element_handler().handle(cmd, metadata).await })
        .await?;
    Ok(with_etag(
        StatusCode::CREATED,
        &result.etag,
        ElementResponse::from(&result.element),
    ))
}

/// GET /api/elements/:id
pub async fn get_element(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(element_id): Path<String>,
) -> Result<Response, ApiError> {
    let element_id = parse_id(&element_id, "element")?;
    let result = state
        .get_element_handler()
        .handle(GetElementQuery { element_id }, command_metadata(&user, &headers))
        .await?;
    Ok(with_etag(
        StatusCode::OK,
        &result.etag,
        ElementResponse::from(&result.element),
    ))
}

/// PUT /api/elements/:id
pub async fn update_element(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(element_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let cmd = UpdateElementCommand {
        element_id: parse_id(&element_id, "element")?,
        if_match: if_match(&headers)?,
        payload,
    };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move { state.update_element_handler().handle(cmd, metadata).await })
        .await?;
    Ok(with_etag(
        StatusCode::OK,
        &result.etag,
        ElementResponse::from(&result.element),
    ))
}

/// DELETE /api/elements/:id
pub async fn delete_element(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(element_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let element_id = parse_id(&element_id, "element")?;
    let cmd = DeleteElementCommand { element_id };
    let metadata = command_metadata(&user, &headers);
    state
        .transaction(|state| async move { state.delete_element_handler().handle(cmd, metadata).await })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════
// Compliance
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/elements/:id/control-implementations
pub async fn element_control_implementations(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(element_id): Path<String>,
    Query(params): Query<ControlImplementationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let element_id: ElementId = parse_id(&element_id, "element")?;
    control_implementations(state, &user, &headers, Some(element_id), params).await
}

/// GET /api/control-implementations?control=<id>
pub async fn control_implementations_of_control(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Query(params): Query<ControlImplementationParams>,
) -> Result<impl IntoResponse, ApiError> {
    control_implementations(state, &user, &headers, None, params).await
}

async fn control_implementations(
    state: AppState,
    user: &AuthenticatedUser,
    headers: &HeaderMap,
    element_id: Option<ElementId>,
    params: ControlImplementationParams,
) -> Result<impl IntoResponse, ApiError> {
    let purpose = match (params.purpose.as_deref(), params.domain.as_deref()) {
        (Some(purpose), Some(domain)) => {
            let purpose = parse_purpose(purpose)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown purpose '{}'", purpose)))?;
            Some((parse_id::<DomainId>(domain, "domain")?, purpose))
        }
        (None, None) => None,
        _ => {
            return Err(ApiError::bad_request(
                "Purpose and domain must be given together",
            ))
        }
    };
    let query = GetControlImplementationsQuery {
        element_id,
        control_id: optional_id(params.control.as_deref(), "control")?,
        purpose,
        page: params.page_params().to_page_request(),
    };
    let page = state
        .control_implementations_handler()
        .handle(query, command_metadata(user, headers))
        .await?;
    Ok(Json(page))
}

/// GET /api/elements/:id/control-implementations/:control_id/requirement-implementations
pub async fn list_requirement_implementations(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((origin_id, control_id)): Path<(String, String)>,
    Query(params): Query<ControlImplementationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListRequirementImplementationsQuery {
        origin_id: parse_id(&origin_id, "element")?,
        control_id: parse_id(&control_id, "control")?,
        page: params.page_params().to_page_request(),
    };
    let page = state
        .list_requirement_implementations_handler()
        .handle(query, command_metadata(&user, &headers))
        .await?;
    Ok(Json(page))
}

/// GET /api/elements/:id/requirement-implementations/:control_id
pub async fn get_requirement_implementation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((origin_id, control_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let query = GetRequirementImplementationQuery {
        origin_id: parse_id(&origin_id, "element")?,
        control_id: parse_id(&control_id, "control")?,
    };
    let result = state
        .get_requirement_implementation_handler()
        .handle(query, command_metadata(&user, &headers))
        .await?;
    Ok(with_etag(
        StatusCode::OK,
        &result.etag,
        result.requirement_implementation,
    ))
}

/// PUT /api/elements/:id/requirement-implementations/:control_id
pub async fn update_requirement_implementation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path((origin_id, control_id)): Path<(String, String)>,
    Json(req): Json<RequirementImplementationRequest>,
) -> Result<Response, ApiError> {
    let cmd = UpdateRequirementImplementationCommand {
        origin_id: parse_id(&origin_id, "element")?,
        control_id: parse_id(&control_id, "control")?,
        if_match: if_match(&headers)?,
        status: req.status,
        implementation_statement: req.implementation_statement,
        origination: req.origination,
        responsible: req.responsible,
    };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move {
            state.update_requirement_implementation_handler().handle(cmd, metadata).await
        })
        .await?;
    Ok(with_etag(
        StatusCode::OK,
        &result.etag,
        result.requirement_implementation,
    ))
}
