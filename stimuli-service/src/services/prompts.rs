//! Prompt builders, one per generation operation.
//!
//! Builders are pure apart from the comment count, which is drawn from an
//! injected [`CommentCountSource`]. Each builder rejects a blank required
//! argument before producing any prompt text.

use super::error::GenerationError;
use crate::models::SamplingConfig;
use rand::Rng;
use std::ops::RangeInclusive;

pub const MIN_COMMENTS: u32 = 10;
pub const MAX_COMMENTS: u32 = 25;

/// Characters of the original post quoted in an elaboration prompt.
pub const ELABORATION_CONTEXT_CHARS: usize = 100;

const TOP_P: f32 = 0.95;

pub const COMMENTS_SAMPLING: SamplingConfig = SamplingConfig {
    temperature: 0.9,
    top_p: TOP_P,
    max_output_tokens: 2048,
};

pub const POST_CONTENT_SAMPLING: SamplingConfig = SamplingConfig {
    temperature: 0.7,
    top_p: TOP_P,
    max_output_tokens: 512,
};

pub const ELABORATION_SAMPLING: SamplingConfig = SamplingConfig {
    temperature: 0.6,
    top_p: TOP_P,
    max_output_tokens: 1024,
};

pub const REPLY_SAMPLING: SamplingConfig = SamplingConfig {
    temperature: 0.75,
    top_p: TOP_P,
    max_output_tokens: 64,
};

/// A fully built prompt and the sampling it must be sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub sampling: SamplingConfig,
}

/// Chooses how many comments to ask the model for.
pub trait CommentCountSource: Send + Sync {
    fn pick(&self, range: RangeInclusive<u32>) -> u32;
}

/// Uniformly random count from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCommentCount;

impl CommentCountSource for RandomCommentCount {
    fn pick(&self, range: RangeInclusive<u32>) -> u32 {
        rand::thread_rng().gen_range(range)
    }
}

/// Always the same count, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedCommentCount(pub u32);

impl CommentCountSource for FixedCommentCount {
    fn pick(&self, range: RangeInclusive<u32>) -> u32 {
        self.0.clamp(*range.start(), *range.end())
    }
}

fn require<'a>(value: &'a str, message: &str) -> Result<&'a str, GenerationError> {
    if value.trim().is_empty() {
        Err(GenerationError::InvalidInput(message.to_string()))
    } else {
        Ok(value)
    }
}

pub fn comments(
    post_context: &str,
    counts: &dyn CommentCountSource,
) -> Result<Prompt, GenerationError> {
    let post_context = require(post_context, "Invalid context provided")?;
    let n = counts.pick(MIN_COMMENTS..=MAX_COMMENTS);

    let text = format!(
        r#"Based on the following online post snippet: "{post_context}"
Generate exactly {n} **highly distinct and varied** comments reacting to the post. Ensure each comment offers a **unique perspective or angle** compared to the others. Comments should be short (10-25 words each), realistic, relevant, constructive, and creative.
Comments should aim to be **thought-provoking**, supportive, curious, **offer an insightful perspective,** or provide a brief related thought that **builds upon the post's idea**.
**Crucially, avoid repeating similar phrases or sentence structures across the comments.**
Do not use hashtags. Do not introduce yourself (e.g., "As an AI..."). Avoid generic questions unless they genuinely add significant value or insight.
Output ONLY a valid JSON array containing exactly {n} strings, where each string is one comment. Example format: ["Comment 1 text.", "Comment 2 text.", ..., "Comment {n} text."]"#
    );

    Ok(Prompt {
        text,
        sampling: COMMENTS_SAMPLING,
    })
}

pub fn post_content(theme: &str) -> Result<Prompt, GenerationError> {
    let theme = require(theme, "Invalid theme provided for post content generation")?;

    let text = format!(
        r#"Generate a community update post of about 250-350 characters, consisting of 2-3 paragraphs, expanding on the theme: "{theme}".
Focus on constructive engagement, community building, or upcoming initiatives.
The output should be plain text. Separate paragraphs with a single newline character (\n). Do NOT use double newlines (\n\n) or any other escape sequences for newlines.
Do not include a title or any preambles like "Here's a post:". Just the post content."#
    );

    Ok(Prompt {
        text,
        sampling: POST_CONTENT_SAMPLING,
    })
}

pub fn elaboration(theme: &str, original_post_context: &str) -> Result<Prompt, GenerationError> {
    let theme = require(theme, "Invalid theme provided for elaboration")?;
    let opening: String = original_post_context
        .chars()
        .take(ELABORATION_CONTEXT_CHARS)
        .collect();

    let text = format!(
        r#"A community post was made with the theme: "{theme}".
The post started with: "{opening}...".
Please provide a detailed explanation or elaboration (2-3 substantial paragraphs, around 400-600 characters total) on this theme to help someone understand it better.
Focus on clarifying concepts, providing context, or offering different perspectives related to the theme.
The output should be plain text. Separate paragraphs with a single newline character (\n). Do NOT use double newlines (\n\n) or any other escape sequences for newlines.
Do not include a title or any preambles like "Here's an elaboration:". Just the elaboration content."#
    );

    Ok(Prompt {
        text,
        sampling: ELABORATION_SAMPLING,
    })
}

pub fn reply(parent_comment_text: &str) -> Result<Prompt, GenerationError> {
    let parent = require(
        parent_comment_text,
        "Invalid parent comment text provided for reply generation",
    )?;

    let text = format!(
        r#"Given the following comment from an online discussion:
"{parent}"
Generate a short, relevant, and engaging reply to this comment (around 5-15 words).
The reply should be conversational and constructive.
Do not introduce yourself (e.g., "As an AI...").
Output ONLY the reply text as a single string. Do not use JSON, arrays, or any other formatting. Just the plain text of the reply."#
    );

    Ok(Prompt {
        text,
        sampling: REPLY_SAMPLING,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_embed_the_pinned_count() {
        let prompt = comments("Our new park opens Saturday", &FixedCommentCount(17)).unwrap();

        assert!(prompt.text.contains("Generate exactly 17 "));
        assert!(prompt.text.contains("containing exactly 17 strings"));
        assert!(prompt.text.contains("\"Our new park opens Saturday\""));
        assert_eq!(prompt.sampling, COMMENTS_SAMPLING);
        assert_eq!(prompt.sampling.max_output_tokens, 2048);
    }

    #[test]
    fn fixed_count_is_clamped_into_range() {
        assert_eq!(FixedCommentCount(3).pick(MIN_COMMENTS..=MAX_COMMENTS), 10);
        assert_eq!(FixedCommentCount(99).pick(MIN_COMMENTS..=MAX_COMMENTS), 25);
    }

    #[test]
    fn random_count_stays_in_range() {
        let source = RandomCommentCount;
        for _ in 0..500 {
            let n = source.pick(MIN_COMMENTS..=MAX_COMMENTS);
            assert!((MIN_COMMENTS..=MAX_COMMENTS).contains(&n));
        }
    }

    #[test]
    fn blank_arguments_are_invalid_input() {
        assert_eq!(
            comments("   ", &FixedCommentCount(10)).unwrap_err(),
            GenerationError::InvalidInput("Invalid context provided".to_string())
        );
        assert!(matches!(
            post_content("\n\t"),
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(matches!(
            elaboration("", "some context"),
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(matches!(reply(" "), Err(GenerationError::InvalidInput(_))));
    }

    #[test]
    fn elaboration_truncates_context_to_first_hundred_chars() {
        let context = "é".repeat(150);
        let prompt = elaboration("Recycling drive", &context).unwrap();

        let quoted = format!("\"{}...\"", "é".repeat(ELABORATION_CONTEXT_CHARS));
        assert!(prompt.text.contains(&quoted));
        assert!(!prompt.text.contains(&"é".repeat(ELABORATION_CONTEXT_CHARS + 1)));
        assert_eq!(prompt.sampling, ELABORATION_SAMPLING);
    }

    #[test]
    fn elaboration_accepts_missing_context() {
        let prompt = elaboration("Recycling drive", "").unwrap();
        assert!(prompt.text.contains("The post started with: \"...\"."));
    }

    #[test]
    fn post_and_reply_use_their_sampling() {
        let post = post_content("Library renovation").unwrap();
        assert!(post.text.contains("\"Library renovation\""));
        assert!(post.text.contains("single newline character (\\n)"));
        assert_eq!(post.sampling.temperature, 0.7);
        assert_eq!(post.sampling.max_output_tokens, 512);

        let answer = reply("Who is bringing snacks?").unwrap();
        assert!(answer.text.contains("(around 5-15 words)"));
        assert_eq!(answer.sampling.temperature, 0.75);
        assert_eq!(answer.sampling.max_output_tokens, 64);
    }
}
