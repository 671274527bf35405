//! Generic request pipeline shared by every generation endpoint.
//!
//! Each endpoint is a [`GenerationRoute`] entry: a path, a field extractor,
//! the key the payload is returned under, and the label used in error
//! messages. [`handle_generation`] applies the same body checks, status
//! policy and error envelope to all of them.

use crate::models::GenerationArgs;
use crate::services::GenerationError;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::FutureExt;
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::panic::AssertUnwindSafe;

/// Pulls typed arguments out of a parsed body, or names the bad field.
pub type Extractor = fn(&Value) -> Result<GenerationArgs, String>;

/// Registry entry binding one endpoint into the pipeline.
pub struct GenerationRoute {
    /// Path below `/api/`.
    pub path: &'static str,
    pub extract: Extractor,
    /// Key the payload is returned under on success.
    pub success_key: &'static str,
    /// Used in "Failed to generate <context>: ..." messages.
    pub context: &'static str,
}

pub static GENERATION_ROUTES: [GenerationRoute; 4] = [
    GenerationRoute {
        path: "generate-comment",
        extract: extract_comments,
        success_key: "comments",
        context: "comments",
    },
    GenerationRoute {
        path: "generate-post-content",
        extract: extract_post_content,
        success_key: "postText",
        context: "post content",
    },
    GenerationRoute {
        path: "elaborate-post",
        extract: extract_elaboration,
        success_key: "elaborationText",
        context: "elaboration",
    },
    GenerationRoute {
        path: "generate-reply",
        extract: extract_reply,
        success_key: "replyText",
        context: "reply",
    },
];

fn required_string(data: &Value, field: &str) -> Result<String, String> {
    match data.get(field).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(format!(
            "Request body must contain a '{}' field as a string.",
            field
        )),
    }
}

fn extract_comments(data: &Value) -> Result<GenerationArgs, String> {
    Ok(GenerationArgs::Comments {
        context: required_string(data, "context")?,
    })
}

fn extract_post_content(data: &Value) -> Result<GenerationArgs, String> {
    Ok(GenerationArgs::PostContent {
        theme: required_string(data, "theme")?,
    })
}

fn extract_elaboration(data: &Value) -> Result<GenerationArgs, String> {
    let theme = required_string(data, "theme")?;
    let original_post_context = data
        .get("originalPostContext")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(GenerationArgs::Elaboration {
        theme,
        original_post_context,
    })
}

fn extract_reply(data: &Value) -> Result<GenerationArgs, String> {
    Ok(GenerationArgs::Reply {
        parent_comment_text: required_string(data, "parentCommentText")?,
    })
}

/// Run one request through validation, generation and response mapping.
pub async fn handle_generation(
    state: AppState,
    route: &'static GenerationRoute,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match run_pipeline(&state, route, body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::info!(
                endpoint = route.path,
                status = err.status_code().as_u16(),
                error = %err,
                "Generation request rejected"
            );
            err.into_response()
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    route: &'static GenerationRoute,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let body = body.map_err(|e| {
        tracing::warn!(endpoint = route.path, error = %e, "Failed to read request body");
        AppError::BadRequest(anyhow::anyhow!("Request body error"))
    })?;

    if body.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Request body cannot be empty."
        )));
    }

    let data: Value = serde_json::from_slice(&body).map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON format in request body."))
    })?;

    let args = (route.extract)(&data).map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

    let outcome = AssertUnwindSafe(state.generator.dispatch(args))
        .catch_unwind()
        .await
        .map_err(|_| {
            tracing::error!(endpoint = route.path, "Generation panicked");
            AppError::ServerError(format!(
                "Internal server error processing {}.",
                route.context
            ))
        })?;

    match outcome {
        Ok(payload) => {
            let mut body = Map::new();
            body.insert(route.success_key.to_string(), Value::from(payload));
            Ok((StatusCode::OK, Json(Value::Object(body))).into_response())
        }
        Err(err) => Err(generation_failure(route, err)),
    }
}

/// Map a failed operation onto the shared error envelope and status policy.
fn generation_failure(route: &GenerationRoute, err: GenerationError) -> AppError {
    let message = format!("Failed to generate {}: {}", route.context, err);
    if err.is_client_error() {
        AppError::BadRequest(anyhow::anyhow!(message))
    } else {
        AppError::ServerError(message)
    }
}
