//! services/agentstream/src/error.rs
//!
//! Defines the primary error type for the AgentStream service.

use crate::config::ConfigError;
use agentstream_core::ports::PortError;

/// The primary error type for the `agentstream` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., opening the data file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
