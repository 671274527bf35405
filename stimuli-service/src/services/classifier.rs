//! Classification of raw backend results into payloads or generation errors.
//!
//! Checks run in a fixed order: missing response, prompt block, candidate
//! safety ratings, missing text, then shape-specific parsing. Safety always
//! runs before any text is looked at.

use super::error::GenerationError;
use super::normalizer::normalize_str;
use crate::models::{GenerationPayload, OutputShape, RawGenerationResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Probability labels that do not block a candidate. Anything else does,
/// including labels we do not recognise.
const ALLOWED_PROBABILITIES: [&str; 2] = ["NEGLIGIBLE", "LOW"];

/// A whole-string fenced block. A language tag only counts as one when a
/// newline follows it.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?\s*([\s\S]*?)\s*```\s*$")
        .expect("valid code fence pattern")
});

/// A fenced reply. `text` is the only tag recognised.
static REPLY_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*```(?:text\b)?\s*([\s\S]*?)\s*```\s*$").expect("valid reply fence pattern")
});

pub fn classify(
    result: Option<&RawGenerationResult>,
    shape: OutputShape,
) -> Result<GenerationPayload, GenerationError> {
    let subject = shape.subject();

    let Some(result) = result else {
        return Err(GenerationError::BackendUnavailable(format!(
            "{}: No response received.",
            shape.failure_prefix()
        )));
    };

    if let Some(reason) = result.block_reason() {
        return Err(GenerationError::PromptBlocked(format!(
            "AI {} blocked: {}",
            subject, reason
        )));
    }

    let candidate = result.first_candidate();

    let flagged = candidate
        .map(|c| {
            c.safety_ratings.iter().any(|rating| {
                !ALLOWED_PROBABILITIES
                    .iter()
                    .any(|allowed| rating.probability.eq_ignore_ascii_case(allowed))
            })
        })
        .unwrap_or(false);
    if flagged {
        return Err(GenerationError::SafetyBlocked(format!(
            "AI {} blocked by safety filter",
            subject
        )));
    }

    let Some(text) = candidate.and_then(|c| c.text()).filter(|t| !t.is_empty()) else {
        return Err(GenerationError::MalformedOutput(format!(
            "AI {} format unexpected (no text part).",
            subject
        )));
    };

    match shape {
        OutputShape::Text => Ok(GenerationPayload::Text(normalize_str(text))),
        OutputShape::Reply => Ok(GenerationPayload::Text(normalize_str(strip_reply_fence(
            text.trim(),
        )))),
        OutputShape::StringArray => parse_string_array(text).map(GenerationPayload::Comments),
    }
}

/// Return the interior of a surrounding fenced block, or the input unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    fence_interior(&CODE_FENCE, text)
}

pub fn strip_reply_fence(text: &str) -> &str {
    fence_interior(&REPLY_FENCE, text)
}

fn fence_interior<'a>(pattern: &Regex, text: &'a str) -> &'a str {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

fn parse_string_array(text: &str) -> Result<Vec<String>, GenerationError> {
    let json = strip_code_fence(text.trim());

    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        tracing::debug!(error = %e, "Model output is not valid JSON");
        GenerationError::MalformedOutput(
            "AI response format incorrect (failed to parse JSON).".to_string(),
        )
    })?;

    let not_strings = || {
        GenerationError::MalformedOutput(
            "AI response format incorrect (not an array of strings).".to_string(),
        )
    };

    value
        .as_array()
        .ok_or_else(not_strings)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(not_strings))
        .collect()
}
