//! Generation operations: prompt, backend call, classification.

use super::classifier::classify;
use super::error::GenerationError;
use super::metrics;
use super::prompts::{self, CommentCountSource, Prompt, RandomCommentCount};
use super::providers::TextProvider;
use crate::models::{GenerationArgs, GenerationPayload, OutputShape, SAFETY_SETTINGS};
use std::sync::Arc;
use std::time::Instant;

/// Characters of a provider fault message passed on to callers.
pub const FAULT_MESSAGE_CHARS: usize = 100;

/// Runs generation operations against a text provider.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn TextProvider>,
    comment_count: Arc<dyn CommentCountSource>,
}

impl Generator {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self::with_comment_count(provider, Arc::new(RandomCommentCount))
    }

    pub fn with_comment_count(
        provider: Arc<dyn TextProvider>,
        comment_count: Arc<dyn CommentCountSource>,
    ) -> Self {
        Self {
            provider,
            comment_count,
        }
    }

    /// Run the operation matching `args`.
    pub async fn dispatch(&self, args: GenerationArgs) -> Result<GenerationPayload, GenerationError> {
        let operation = args.operation();

        let result = match args {
            GenerationArgs::Comments { context } => {
                self.comments(&context).await.map(GenerationPayload::Comments)
            }
            GenerationArgs::PostContent { theme } => {
                self.post_content(&theme).await.map(GenerationPayload::Text)
            }
            GenerationArgs::Elaboration {
                theme,
                original_post_context,
            } => self
                .elaborate(&theme, &original_post_context)
                .await
                .map(GenerationPayload::Text),
            GenerationArgs::Reply {
                parent_comment_text,
            } => self.reply(&parent_comment_text).await.map(GenerationPayload::Text),
        };

        match &result {
            Ok(_) => {
                tracing::info!(operation, "Generation succeeded");
                metrics::record_generation(operation, "ok");
            }
            Err(e) => {
                tracing::warn!(operation, kind = e.kind(), error = %e, "Generation failed");
                metrics::record_generation(operation, e.kind());
            }
        }

        result
    }

    pub async fn comments(&self, post_context: &str) -> Result<Vec<String>, GenerationError> {
        let prompt = prompts::comments(post_context, self.comment_count.as_ref())?;
        match self.run(prompt, OutputShape::StringArray).await? {
            GenerationPayload::Comments(comments) => Ok(comments),
            GenerationPayload::Text(_) => Err(unexpected_shape()),
        }
    }

    pub async fn post_content(&self, theme: &str) -> Result<String, GenerationError> {
        let prompt = prompts::post_content(theme)?;
        self.run_text(prompt, OutputShape::Text).await
    }

    pub async fn elaborate(
        &self,
        theme: &str,
        original_post_context: &str,
    ) -> Result<String, GenerationError> {
        let prompt = prompts::elaboration(theme, original_post_context)?;
        self.run_text(prompt, OutputShape::Text).await
    }

    pub async fn reply(&self, parent_comment_text: &str) -> Result<String, GenerationError> {
        let prompt = prompts::reply(parent_comment_text)?;
        self.run_text(prompt, OutputShape::Reply).await
    }

    async fn run_text(&self, prompt: Prompt, shape: OutputShape) -> Result<String, GenerationError> {
        match self.run(prompt, shape).await? {
            GenerationPayload::Text(text) => Ok(text),
            GenerationPayload::Comments(_) => Err(unexpected_shape()),
        }
    }

    async fn run(&self, prompt: Prompt, shape: OutputShape) -> Result<GenerationPayload, GenerationError> {
        let provider = self.provider.name();
        let model = self.provider.model();

        let start = Instant::now();
        let raw = self
            .provider
            .generate(&prompt.text, &prompt.sampling, &SAFETY_SETTINGS)
            .await;
        metrics::record_provider_latency(provider, model, start.elapsed().as_secs_f64());

        let raw = raw.map_err(|e| {
            tracing::error!(provider, model, error = %e, "Provider call failed");
            metrics::record_provider_error(provider, e.error_type());
            GenerationError::BackendUnavailable(format!(
                "{}: {}",
                shape.failure_prefix(),
                truncate_chars(e.message(), FAULT_MESSAGE_CHARS)
            ))
        })?;

        classify(raw.as_ref(), shape)
    }
}

fn unexpected_shape() -> GenerationError {
    GenerationError::MalformedOutput("AI response format unexpected.".to_string())
}

/// First `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, RawGenerationResult};
    use crate::services::prompts::{
        FixedCommentCount, COMMENTS_SAMPLING, ELABORATION_SAMPLING, REPLY_SAMPLING,
    };
    use crate::services::providers::mock::MockTextProvider;
    use crate::services::providers::ProviderError;

    fn generator(provider: Arc<MockTextProvider>) -> Generator {
        Generator::with_comment_count(provider, Arc::new(FixedCommentCount(12)))
    }

    #[tokio::test]
    async fn comments_parse_fenced_array_and_send_fixed_config() {
        let provider = Arc::new(MockTextProvider::with_text(
            "```json\n[\"Love it\", \"See you there\"]\n```",
        ));

        let comments = generator(provider.clone())
            .comments("Our new park opens Saturday")
            .await
            .unwrap();

        assert_eq!(comments, vec!["Love it", "See you there"]);
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("exactly 12 "));
        assert_eq!(calls[0].sampling, COMMENTS_SAMPLING);
        assert_eq!(calls[0].safety, SAFETY_SETTINGS.to_vec());
    }

    #[tokio::test]
    async fn comments_outcome_is_error_or_bounded_string_array() {
        let body: Vec<String> = (0..12).map(|i| format!("Comment number {i}")).collect();
        let provider = Arc::new(MockTextProvider::with_text(
            serde_json::to_string(&body).unwrap(),
        ));

        let outcome = generator(provider)
            .comments("Our new park opens Saturday")
            .await;
        if let Ok(comments) = outcome {
            assert!((10..=25).contains(&comments.len()));
        }
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_backend() {
        let provider = Arc::new(MockTextProvider::with_text("unused"));
        let gen = generator(provider.clone());

        assert!(matches!(
            gen.comments("  ").await,
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(matches!(
            gen.post_content("").await,
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(matches!(
            gen.elaborate("\n", "ctx").await,
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(matches!(
            gen.reply("\t").await,
            Err(GenerationError::InvalidInput(_))
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn post_content_is_normalized() {
        let provider = Arc::new(MockTextProvider::with_text(
            "First paragraph.\\n\\nSecond paragraph.\n\n\nThird.",
        ));

        let text = generator(provider).post_content("Spring cleanup").await.unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.\nThird.");
    }

    #[tokio::test]
    async fn elaboration_uses_its_sampling() {
        let provider = Arc::new(MockTextProvider::with_text("Some detail."));

        let text = generator(provider.clone())
            .elaborate("Spring cleanup", "We are meeting at the park")
            .await
            .unwrap();

        assert_eq!(text, "Some detail.");
        assert_eq!(provider.calls()[0].sampling, ELABORATION_SAMPLING);
    }

    #[tokio::test]
    async fn reply_strips_fence_and_uses_its_sampling() {
        let provider = Arc::new(MockTextProvider::with_text("```text\nCount me in!\n```"));

        let text = generator(provider.clone())
            .reply("Who wants to help plant trees?")
            .await
            .unwrap();

        assert_eq!(text, "Count me in!");
        assert_eq!(provider.calls()[0].sampling, REPLY_SAMPLING);
    }

    #[tokio::test]
    async fn provider_fault_is_truncated_backend_unavailable() {
        let long: String = ('a'..='z').cycle().take(200).collect();
        let provider = Arc::new(MockTextProvider::failing(ProviderError::NetworkError(
            long.clone(),
        )));

        let err = generator(provider).post_content("hello").await.unwrap_err();
        let message = match err {
            GenerationError::BackendUnavailable(message) => message,
            other => panic!("expected BackendUnavailable, got {other:?}"),
        };
        let detail = message.strip_prefix("AI generation failed: ").unwrap();
        assert_eq!(detail, &long[..FAULT_MESSAGE_CHARS]);
    }

    #[tokio::test]
    async fn reply_fault_names_the_reply() {
        let provider = Arc::new(MockTextProvider::failing(ProviderError::RateLimited));

        let err = generator(provider).reply("hello").await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::BackendUnavailable(
                "AI reply generation failed: Rate limited".to_string()
            )
        );
    }

    #[tokio::test]
    async fn safety_block_is_surfaced_without_text() {
        let provider = Arc::new(MockTextProvider::with_result(RawGenerationResult {
            prompt_feedback: None,
            candidates: vec![Candidate::from_text("[\"bad\"]")
                .with_rating("HARM_CATEGORY_HARASSMENT", "MEDIUM")],
        }));

        let err = generator(provider).comments("context").await.unwrap_err();
        assert!(matches!(err, GenerationError::SafetyBlocked(_)));
    }

    #[tokio::test]
    async fn dispatch_routes_by_argument_variant() {
        let provider = Arc::new(MockTextProvider::with_text("Thanks!"));

        let payload = generator(provider.clone())
            .dispatch(GenerationArgs::Reply {
                parent_comment_text: "Nice work".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(payload, GenerationPayload::Text("Thanks!".to_string()));
        assert_eq!(provider.calls()[0].sampling, REPLY_SAMPLING);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
