use thiserror::Error;

/// Failure of a generation operation. Every variant carries a message that
/// is safe to return to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Client-fixable: a required field was blank.
    #[error("{0}")]
    InvalidInput(String),

    /// A candidate was rated above the allowed harm probability.
    #[error("{0}")]
    SafetyBlocked(String),

    /// The backend refused the prompt itself.
    #[error("{0}")]
    PromptBlocked(String),

    /// The backend answered with missing or wrongly shaped content.
    #[error("{0}")]
    MalformedOutput(String),

    /// Transport, quota or timeout fault, or no response at all.
    #[error("{0}")]
    BackendUnavailable(String),
}

impl GenerationError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput(_) => "invalid_input",
            GenerationError::SafetyBlocked(_) => "safety_blocked",
            GenerationError::PromptBlocked(_) => "prompt_blocked",
            GenerationError::MalformedOutput(_) => "malformed_output",
            GenerationError::BackendUnavailable(_) => "backend_unavailable",
        }
    }

    /// Whether the failure is attributed to the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidInput(_)
                | GenerationError::SafetyBlocked(_)
                | GenerationError::MalformedOutput(_)
        )
    }
}
