use super::AppState;
use crate::{
    auth::Identity,
    errors::ServiceError,
    models::{NewProduct, Product},
    ApiResponse, ApiResult,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List the caller's products
pub async fn list_products(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<Product>> {
    let products = state.services.products.list(&identity).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// Register a product; responds with the re-listed products
pub async fn create_product(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(payload) = payload?;
    let products = state.services.products.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(products))))
}
