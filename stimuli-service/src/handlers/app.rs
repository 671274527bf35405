use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::io::ErrorKind;

/// Serve `index.html` from the configured static directory.
pub async fn index(State(state): State<AppState>) -> Response {
    let path = state.static_dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "index.html missing");
            (StatusCode::NOT_FOUND, "404 Not Found: index.html missing.").into_response()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read index.html");
            (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error.").into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
