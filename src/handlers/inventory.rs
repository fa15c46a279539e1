use super::AppState;
use crate::{
    assembler::{EntryView, ExitView, UsageView},
    auth::Identity,
    errors::ServiceError,
    models::{NewEntry, NewExit, NewUsage},
    services::BatchLabel,
    ApiResponse, ApiResult,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn list_entries(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<EntryView>> {
    let entries = state.services.entries.list(&identity).await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub async fn create_entry(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(payload) = payload?;
    let entries = state.services.entries.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entries))))
}

/// QR label payload for one of the caller's entries
pub async fn entry_label(
    State(state): State<AppState>,
    identity: Identity,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<BatchLabel> {
    let label = state.services.labels.for_entry(&identity, entry_id).await?;
    Ok(Json(ApiResponse::success(label)))
}

pub async fn list_exits(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<ExitView>> {
    let exits = state.services.exits.list(&identity).await?;
    Ok(Json(ApiResponse::success(exits)))
}

pub async fn create_exit(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewExit>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(payload) = payload?;
    let exits = state.services.exits.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(exits))))
}

pub async fn list_usage(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<UsageView>> {
    let usage = state.services.usage.list(&identity).await?;
    Ok(Json(ApiResponse::success(usage)))
}

pub async fn create_usage(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewUsage>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(payload) = payload?;
    let usage = state.services.usage.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(usage))))
}
