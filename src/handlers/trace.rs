use super::AppState;
use crate::{
    errors::{FieldViolation, ServiceError},
    services::{TraceQuery, TraceReport},
    ApiResponse, ApiResult,
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TraceParams {
    pub batch: Option<String>,
    pub product: Option<String>,
}

impl TryFrom<TraceParams> for TraceQuery {
    type Error = ServiceError;

    fn try_from(params: TraceParams) -> Result<Self, Self::Error> {
        match (params.batch, params.product) {
            (Some(batch), _) => Ok(TraceQuery::Batch(batch)),
            (None, Some(product)) => Ok(TraceQuery::Product(product)),
            (None, None) => Err(FieldViolation::new(
                "search",
                "required",
                "Provide a batch number or a product name",
            )
            .into()),
        }
    }
}

/// Public chain-of-custody lookup by batch number or product name
pub async fn trace(
    State(state): State<AppState>,
    Query(params): Query<TraceParams>,
) -> ApiResult<TraceReport> {
    let query = TraceQuery::try_from(params)?;
    let report = state.services.trace.search(&query).await?;
    Ok(Json(ApiResponse::success(report)))
}
