//! Agritrace library
//!
//! Supply-chain tracking for organic produce: products, batch intake and
//! transfer, local usage and a public chain-of-custody trace, all assembled
//! client-side from flat fetches of a hosted table backend.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod assembler;
pub mod auth;
pub mod config;
pub mod errors;
pub mod generation;
pub mod handlers;
pub mod index;
pub mod models;
pub mod query;
pub mod services;
pub mod timeline;
pub mod validation;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::TokenVerifier;
use crate::handlers::AppServices;
use crate::query::{QueryFacade, TableClient};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(client: Arc<dyn TableClient>, verifier: TokenVerifier) -> Self {
        Self {
            services: AppServices::new(QueryFacade::new(client)),
            verifier: Arc::new(verifier),
        }
    }
}

/// Standard API response envelope
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{account, analytics, inventory, products, trace};

    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/entries",
            get(inventory::list_entries).post(inventory::create_entry),
        )
        .route("/entries/:id/label", get(inventory::entry_label))
        .route(
            "/exits",
            get(inventory::list_exits).post(inventory::create_exit),
        )
        .route(
            "/usage",
            get(inventory::list_usage).post(inventory::create_usage),
        )
        .route("/trace", get(trace::trace))
        .route("/analytics", get(analytics::analytics))
        .route("/me", get(account::me))
}

/// Full application router with request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_carries_data_and_timestamp() {
        let response = ApiResponse::success(vec![1, 2]);
        assert!(response.success);
        assert_eq!(response.data, Some(vec![1, 2]));

        let meta = response.meta.expect("metadata expected");
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_has_no_data() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
