//! services/agentstream/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use agentstream_core::FeedConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_path: PathBuf,
    pub log_level: Level,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub http_timeout: Duration,
    pub feed: FeedConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let data_path = std::env::var("AGENTSTREAM_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./agentstream_store.json"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Gemini endpoint ---
        let gemini_api_base = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let http_timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 60)?);

        // --- Feed sizing ---
        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            initial_feed_size: parse_var("INITIAL_FEED_SIZE", defaults.initial_feed_size)?,
            batch_size: parse_var("BATCH_SIZE", defaults.batch_size)?,
            max_workflows: parse_var("MAX_WORKFLOWS", defaults.max_workflows)?,
            refresh_cooldown: Duration::from_millis(parse_var(
                "REFRESH_COOLDOWN_MS",
                defaults.refresh_cooldown.as_millis() as u64,
            )?),
        };

        Ok(Self {
            data_path,
            log_level,
            gemini_api_base,
            gemini_model,
            http_timeout,
            feed,
        })
    }
}

/// Reads an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
