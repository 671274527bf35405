//! Mock provider implementation for testing.

use super::{ProviderError, TextProvider};
use crate::models::{RawGenerationResult, SafetySetting, SamplingConfig};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock does when asked to generate.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the given envelope (`None` = no response at all).
    Respond(Option<RawGenerationResult>),
    /// Fail with the given provider error.
    Fail(ProviderError),
    /// Panic inside the call, simulating an unexpected fault.
    Panic(String),
}

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub sampling: SamplingConfig,
    pub safety: Vec<SafetySetting>,
}

/// Scripted text provider that records every call it receives.
pub struct MockTextProvider {
    behavior: MockBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Respond with a single clean candidate carrying `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Respond(Some(RawGenerationResult::from_text(
            text,
        ))))
    }

    pub fn with_result(result: RawGenerationResult) -> Self {
        Self::new(MockBehavior::Respond(Some(result)))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockBehavior::Fail(error))
    }

    pub fn panicking(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Panic(message.into()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        sampling: &SamplingConfig,
        safety: &[SafetySetting],
    ) -> Result<Option<RawGenerationResult>, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                sampling: *sampling,
                safety: safety.to_vec(),
            });
        }

        match &self.behavior {
            MockBehavior::Respond(result) => Ok(result.clone()),
            MockBehavior::Fail(error) => Err(error.clone()),
            MockBehavior::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
