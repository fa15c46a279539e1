use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe; does not touch the table backend
pub async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
