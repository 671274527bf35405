//! Domain models for the stimuli service.

pub mod generation;

pub use generation::{
    Candidate, GenerationArgs, GenerationPayload, OutputShape, RawGenerationResult,
    SafetySetting, SamplingConfig, SAFETY_SETTINGS,
};
