//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` REST method and hands the response envelope
//! back untouched; classification happens in the generator.

use super::{ProviderError, TextProvider};
use crate::models::{RawGenerationResult, SafetySetting, SamplingConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
    base_url: String,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config, GEMINI_API_BASE)
    }

    /// Point the provider at a different API root, e.g. a local stub.
    pub fn with_base_url(
        config: GeminiConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.config.model, method, self.config.api_key
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        sampling: &SamplingConfig,
        safety: &[SafetySetting],
    ) -> Result<Option<RawGenerationResult>, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: sampling,
            safety_settings: safety,
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            temperature = sampling.temperature,
            max_output_tokens = sampling.max_output_tokens,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice::<Option<RawGenerationResult>>(&body)
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Gemini API Request Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a SamplingConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SAFETY_SETTINGS;
    use crate::services::prompts::REPLY_SAMPLING;

    #[test]
    fn request_body_matches_gemini_schema() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: "hi" }],
            }],
            generation_config: &REPLY_SAMPLING,
            safety_settings: &SAFETY_SETTINGS,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
        assert!(json["generationConfig"]["topP"].is_number());
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(
            json["safetySettings"][0]["category"],
            "HARM_CATEGORY_HARASSMENT"
        );
    }

    #[test]
    fn api_url_includes_model_and_key() {
        let provider = GeminiTextProvider::with_base_url(
            GeminiConfig {
                api_key: "k".to_string(),
                model: "gemini-2.0-flash".to_string(),
            },
            "http://localhost:1",
        )
        .unwrap();

        assert_eq!(
            provider.api_url("generateContent"),
            "http://localhost:1/models/gemini-2.0-flash:generateContent?key=k"
        );
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = GeminiTextProvider::new(GeminiConfig {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
        });
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
