//! services/agentstream/src/adapters/gemini.rs
//!
//! This module contains the adapter for the Gemini text-generation endpoint.
//! It implements the `TextGenerationService` port from the `core` crate.

use agentstream_core::ports::{
    CredentialProvider, GenerationRequest, PortError, PortResult, TextGenerationService,
    TextStream,
};
use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: [Part { text }],
        }
    }
}

impl<'a> From<&'a GenerationRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            contents: [Content::text(&request.prompt)],
            system_instruction: request.system_instruction.as_deref().map(Content::text),
        }
    }
}

/// The subset of a `generateContent` response (or one SSE chunk of it) we read.
#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, when present.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` against the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`. The API key is looked up through
    /// `credentials` on every call, so logins after construction are honoured.
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> PortResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Network(format!("failed building HTTP client: {e}")))?;

        let api_base = api_base.into().trim_end_matches('/').to_string();
        let model = model.into();
        info!(api_base = %api_base, model = %model, "Initialized Gemini client");

        Ok(Self {
            http,
            api_base,
            model,
            credentials,
        })
    }

    fn api_key(&self) -> PortResult<String> {
        self.credentials
            .api_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PortError::Auth("No API key configured".to_string()))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, self.model, method)
    }

    /// Sends `request` to `method` and returns the response once it is known to
    /// be successful.
    async fn send(
        &self,
        method: &str,
        query: &[(&str, &str)],
        request: &GenerationRequest,
    ) -> PortResult<reqwest::Response> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint(method))
            .query(query)
            .query(&[("key", api_key.as_str())])
            .json(&GenerateContentRequest::from(request))
            .send()
            .await
            .map_err(|e| PortError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| format!("API request failed with status {status}"));
        warn!(%status, method, "Gemini request rejected: {}", message);
        Err(PortError::Api(message))
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String> {
        let response = self.send("generateContent", &[], request).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|_| PortError::Format("Invalid response format".to_string()))?;

        body.into_text()
            .ok_or_else(|| PortError::Format("Invalid response format".to_string()))
    }

    async fn stream_content(&self, request: &GenerationRequest) -> PortResult<TextStream> {
        let response = self
            .send("streamGenerateContent", &[("alt", "sse")], request)
            .await?;

        // The request URL carries the API key; keep it out of error messages.
        let bytes = response.bytes_stream().map(|read| read.map_err(|e| e.without_url()));
        Ok(sse_text_fragments(bytes))
    }
}

/// Turns a raw SSE byte stream into the text fragments it carries.
///
/// Events whose data is not a JSON response chunk, or that carry no text, are
/// skipped. A transport error becomes a `Network` item.
pub fn sse_text_fragments<S, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    bytes
        .eventsource()
        .filter_map(|event| {
            future::ready(match event {
                Ok(event) => decode_fragment(&event.data).map(Ok),
                Err(e) => Some(Err(PortError::Network(e.to_string()))),
            })
        })
        .boxed()
}

fn decode_fragment(data: &str) -> Option<String> {
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(chunk) => {
            let text = chunk.into_text();
            if text.is_none() {
                debug!("Skipping stream fragment without text");
            }
            text
        }
        Err(e) => {
            debug!(error = %e, "Skipping malformed stream fragment");
            None
        }
    }
}
