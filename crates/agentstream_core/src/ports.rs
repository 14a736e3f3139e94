//! crates/agentstream_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete key-value store and text-generation endpoint.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all port and core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Missing or empty required input, such as a blank API key.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Missing credential or a rejected/cancelled sign-in.
    #[error("Authentication error: {0}")]
    Auth(String),
    /// The generation endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),
    /// The generation endpoint answered with a non-success status.
    #[error("API error: {0}")]
    Api(String),
    /// A response did not have the expected shape.
    #[error("Format error: {0}")]
    Format(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl PortError {
    /// Whether a one-shot generation failing with this error should fall back
    /// to the built-in workflows instead of surfacing to the caller.
    pub fn is_recoverable_generation_failure(&self) -> bool {
        matches!(
            self,
            PortError::Network(_) | PortError::Api(_) | PortError::Format(_)
        )
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Key-Value Store
//=========================================================================================

/// A persistent string-to-string dictionary.
///
/// Values are opaque text; structured data is serialized by `storage::Storage`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn set(&self, key: &str, value: String) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// Supplies the API credential to a text-generation client at call time.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

//=========================================================================================
// Text Generation
//=========================================================================================

/// A prompt plus the optional system instruction that frames it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// A stream of text fragments in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Requests a complete generation and returns its text.
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String>;

    /// Opens a streaming generation. Fragments that could not be decoded are
    /// already dropped by the implementation; an `Err` item ends the stream.
    async fn stream_content(&self, request: &GenerationRequest) -> PortResult<TextStream>;

    /// Streams a generation, calling `on_chunk(fragment, accumulated)` for every
    /// fragment, and returns the accumulated text once the stream closes.
    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
        on_chunk: &mut (dyn for<'a, 'b> FnMut(&'a str, &'b str) + Send),
    ) -> PortResult<String> {
        let mut stream = self.stream_content(request).await?;
        let mut full_text = String::new();

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            full_text.push_str(&fragment);
            on_chunk(&fragment, &full_text);
        }

        Ok(full_text)
    }
}
