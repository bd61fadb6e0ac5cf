//! HTTP handlers for admin endpoints.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::parse_id;
use crate::adapters::http::middleware::{command_metadata, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::DeleteClientCommand;

/// DELETE /api/admin/clients/:id
pub async fn delete_client(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(client_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let client_id = parse_id(&client_id, "client")?;
    tracing::info!(%client_id, admin = %user.username, "Client deletion requested");
    let cmd = DeleteClientCommand { client_id };
    let metadata = command_metadata(&user, &headers);
    state
        .transaction(|state| async move { state.delete_client_handler().handle(cmd, metadata).await })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
