//! Request-scoped generation types.
//!
//! The wire types (`RawGenerationResult` and friends) follow the Gemini
//! `generateContent` response shape so the provider can deserialize straight
//! into them and tests can build them by hand.

use serde::{Deserialize, Serialize};

/// Validated arguments for one generation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationArgs {
    Comments {
        context: String,
    },
    PostContent {
        theme: String,
    },
    Elaboration {
        theme: String,
        original_post_context: String,
    },
    Reply {
        parent_comment_text: String,
    },
}

impl GenerationArgs {
    /// Short operation name used in logs and metric labels.
    pub fn operation(&self) -> &'static str {
        match self {
            GenerationArgs::Comments { .. } => "comments",
            GenerationArgs::PostContent { .. } => "post_content",
            GenerationArgs::Elaboration { .. } => "elaboration",
            GenerationArgs::Reply { .. } => "reply",
        }
    }
}

/// Sampling parameters sent with every backend call. Fixed per operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// Gemini harm categories covered by the gateway's safety settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Safety settings applied to every operation.
pub const SAFETY_SETTINGS: [SafetySetting; 4] = [
    SafetySetting {
        category: HarmCategory::HarmCategoryHarassment,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategoryHateSpeech,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategorySexuallyExplicit,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    },
    SafetySetting {
        category: HarmCategory::HarmCategoryDangerousContent,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    },
];

/// What the classifier should extract from a successful candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Free text, normalized into newline-separated paragraphs.
    Text,
    /// A JSON array of strings, optionally inside a fenced code block.
    StringArray,
    /// A single short line, optionally inside a fenced code block.
    Reply,
}

impl OutputShape {
    /// What failure messages call the backend output.
    pub fn subject(self) -> &'static str {
        match self {
            OutputShape::Reply => "reply",
            OutputShape::Text | OutputShape::StringArray => "response",
        }
    }

    /// Prefix for failures where no usable response came back.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            OutputShape::Reply => "AI reply generation failed",
            OutputShape::Text | OutputShape::StringArray => "AI generation failed",
        }
    }
}

/// Successful result of a generation operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationPayload {
    Text(String),
    Comments(Vec<String>),
}

impl From<GenerationPayload> for serde_json::Value {
    fn from(payload: GenerationPayload) -> Self {
        match payload {
            GenerationPayload::Text(text) => serde_json::Value::String(text),
            GenerationPayload::Comments(comments) => serde_json::Value::from(comments),
        }
    }
}

/// Backend response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

impl RawGenerationResult {
    /// A single candidate carrying `text` and no safety ratings.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            prompt_feedback: None,
            candidates: vec![Candidate::from_text(text)],
        }
    }

    /// A prompt-level refusal with no candidates.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some(reason.into()),
            }),
            candidates: Vec::new(),
        }
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    pub fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

impl Candidate {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(Content {
                parts: vec![Part {
                    text: Some(text.into()),
                }],
            }),
            safety_ratings: Vec::new(),
            finish_reason: Some("STOP".to_string()),
        }
    }

    pub fn with_rating(mut self, category: &str, probability: &str) -> Self {
        self.safety_ratings.push(SafetyRating {
            category: category.to_string(),
            probability: probability.to_string(),
        });
        self
    }

    /// Text of the first content part, if any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_gemini_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}]},
                "finishReason": "STOP",
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}
                ]
            }],
            "usageMetadata": {"promptTokenCount": 4}
        }"#;

        let result: RawGenerationResult = serde_json::from_str(raw).unwrap();
        let candidate = result.first_candidate().unwrap();
        assert_eq!(candidate.text(), Some("Hello"));
        assert_eq!(candidate.safety_ratings[0].probability, "NEGLIGIBLE");
        assert_eq!(result.block_reason(), None);
    }

    #[test]
    fn deserializes_prompt_feedback_without_candidates() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;

        let result: RawGenerationResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.block_reason(), Some("SAFETY"));
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn safety_settings_serialize_in_gemini_form() {
        let json = serde_json::to_value(SAFETY_SETTINGS[1]).unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(json["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn payload_serializes_untagged() {
        let comments = GenerationPayload::Comments(vec!["a".into(), "b".into()]);
        assert_eq!(
            serde_json::to_value(&comments).unwrap(),
            serde_json::json!(["a", "b"])
        );
        let text = GenerationPayload::Text("hi".into());
        assert_eq!(serde_json::to_value(&text).unwrap(), serde_json::json!("hi"));
    }
}
