use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Never touches the backend.
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "awake" }))
}
