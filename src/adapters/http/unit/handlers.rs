//! HTTP handlers for unit endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::{if_match, parse_id, with_etag};
use crate::adapters::http::middleware::{command_metadata, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::unit::{
    CreateUnitCommand, DeleteUnitCommand, GetUnitQuery, ListUnitsQuery, UpdateUnitCommand,
};
use crate::domain::foundation::UnitId;

use super::dto::{DeleteUnitResponse, ListUnitsParams, UnitRequest, UnitResponse};

/// GET /api/units
pub async fn list_units(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Query(params): Query<ListUnitsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let parent = params
        .parent
        .as_deref()
        .map(|raw| parse_id::<UnitId>(raw, "unit"))
        .transpose()?;
    let units = state
        .list_units_handler()
        .handle(ListUnitsQuery { parent }, command_metadata(&user, &headers))
        .await?;
    let body: Vec<UnitResponse> = units.iter().map(UnitResponse::from).collect();
    Ok(Json(body))
}

/// POST /api/units
pub async fn create_unit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(req): Json<UnitRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateUnitCommand {
        name: req.name,
        abbreviation: req.abbreviation,
        description: req.description,
        parent_id: req.parent,
        domains: req.domains,
    };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move { state.create_unit_handler().handle(cmd, metadata).await })
        .await?;
    Ok(with_etag(
        StatusCode::CREATED,
        &result.etag,
        UnitResponse::from(&result.unit),
    ))
}

/// GET /api/units/:id
pub async fn get_unit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(unit_id): Path<String>,
) -> Result<Response, ApiError> {
    let unit_id = parse_id(&unit_id, "unit")?;
    let result = state
        .get_unit_handler()
        .handle(GetUnitQuery { unit_id }, command_metadata(&user, &headers))
        .await?;
    Ok(with_etag(StatusCode::OK, &result.etag, UnitResponse::from(&result.unit)))
}

/// PUT /api/units/:id
pub async fn update_unit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(unit_id): Path<String>,
    Json(req): Json<UnitRequest>,
) -> Result<Response, ApiError> {
    let cmd = UpdateUnitCommand {
        unit_id: parse_id(&unit_id, "unit")?,
        if_match: if_match(&headers)?,
        name: req.name,
        abbreviation: req.abbreviation,
        description: req.description,
        domains: req.domains,
    };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move { state.update_unit_handler().handle(cmd, metadata).await })
        .await?;
    Ok(with_etag(StatusCode::OK, &result.etag, UnitResponse::from(&result.unit)))
}

/// DELETE /api/units/:id
pub async fn delete_unit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(unit_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let unit_id = parse_id(&unit_id, "unit")?;
    let cmd = DeleteUnitCommand { unit_id };
    let metadata = command_metadata(&user, &headers);
    let result = state
        .transaction(|state| async move { state.delete_unit_handler().handle(cmd, metadata).await })
        .await?;
    Ok(Json(DeleteUnitResponse {
        deleted_units: result.deleted_units,
        deleted_elements: result.deleted_elements,
    }))
}
