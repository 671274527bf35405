use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_STIMULI_KEY";

const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct StimuliConfig {
    pub common: core_config::Config,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model used for every text operation (e.g., gemini-2.0-flash)
    pub text_model: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding `index.html`.
    pub static_dir: PathBuf,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub otlp_endpoint: Option<String>,
}

impl StimuliConfig {
    /// Load configuration. Fails when the API key is missing.
    pub fn load() -> Result<Self, AppError> {
        let mut common = core_config::Config::load()?;
        if let Some(port) = optional_env("PORT") {
            common.port = port.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("PORT must be a port number: {}", e))
            })?;
        }

        Ok(StimuliConfig {
            common,
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL))?,
            },
            google: GoogleConfig {
                api_key: get_env(API_KEY_ENV, None)?,
            },
            server: ServerConfig {
                static_dir: PathBuf::from(get_env("STATIC_DIR", Some(DEFAULT_STATIC_DIR))?),
                shutdown_grace_seconds: optional_env("SHUTDOWN_GRACE_SECONDS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECONDS),
            },
            observability: ObservabilityConfig {
                otlp_endpoint: optional_env("OTLP_ENDPOINT"),
            },
        })
    }
}

/// Read a variable, treating an empty value as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match optional_env(key) {
        Some(val) => Ok(val),
        None => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_falls_back_to_default() {
        let value = get_env("STIMULI_TEST_SURELY_UNSET_VAR", Some("fallback")).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_without_default_is_config_error() {
        let err = get_env("STIMULI_TEST_SURELY_UNSET_VAR", None).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("STIMULI_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        env::set_var("STIMULI_TEST_BLANK_VAR", "   ");
        assert_eq!(optional_env("STIMULI_TEST_BLANK_VAR"), None);
        env::remove_var("STIMULI_TEST_BLANK_VAR");
    }
}
