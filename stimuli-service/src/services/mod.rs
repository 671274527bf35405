pub mod classifier;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod normalizer;
pub mod prompts;
pub mod providers;

pub use error::GenerationError;
pub use generator::Generator;
