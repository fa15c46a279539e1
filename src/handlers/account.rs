use super::AppState;
use crate::{auth::Identity, services::AccountSummary, ApiResponse, ApiResult};
use axum::{extract::State, Json};

/// The caller's profile and role
pub async fn me(State(state): State<AppState>, identity: Identity) -> ApiResult<AccountSummary> {
    let summary = state.services.account.summary(&identity).await?;
    Ok(Json(ApiResponse::success(summary)))
}
