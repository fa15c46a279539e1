use super::AppState;
use crate::{auth::Identity, services::AnalyticsReport, ApiResponse, ApiResult};
use axum::{extract::State, Json};
use tracing::info;

pub async fn analytics(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<AnalyticsReport> {
    info!(user_id = %identity.user_id, "Analytics requested");
    let report = state.services.analytics.report().await?;
    Ok(Json(ApiResponse::success(report)))
}
