//! Generative text backend abstraction.
//!
//! The gateway only ever talks to a [`TextProvider`]. The Gemini provider is
//! used in production; the mock provider drives tests without a network.

pub mod gemini;
pub mod mock;

use crate::models::{RawGenerationResult, SafetySetting, SamplingConfig};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// The underlying fault text, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::NotConfigured(msg)
            | ProviderError::ApiError(msg)
            | ProviderError::NetworkError(msg) => msg,
            ProviderError::RateLimited => "Rate limited",
        }
    }

    /// Metric label for the error.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// A backend that turns a prompt into a raw generation result.
///
/// `Ok(None)` means the backend answered without a response body.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        sampling: &SamplingConfig,
        safety: &[SafetySetting],
    ) -> Result<Option<RawGenerationResult>, ProviderError>;

    /// Provider name used in metric labels.
    fn name(&self) -> &'static str;

    /// Model identifier used in metric labels.
    fn model(&self) -> &str;
}
