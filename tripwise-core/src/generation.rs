//! Generation client for Tripwise — text generation via the Gemini API
//!
//! Provides a `GenerationBackend` trait so the itinerary pipeline can be driven
//! by deterministic stubs in tests, and `GeminiGenerationClient`, the real
//! implementation. One attempt per call; failures surface immediately.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::{ApiKey, GenerationSettings};

// ============================================================================
// GenerationBackend trait
// ============================================================================

/// Abstraction over text-generation providers.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for `prompt`. Returns `None` when the provider
    /// answered successfully but produced no text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Generation request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },
}

// ============================================================================
// Config
// ============================================================================

/// Gemini generation client configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GenerationConfig {
    pub fn new(api_key: Option<ApiKey>, settings: &GenerationSettings) -> Self {
        Self {
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ============================================================================
// GeminiGenerationClient
// ============================================================================

/// Gemini text client — calls `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiGenerationClient {
    client: Client,
    config: GenerationConfig,
}

impl GeminiGenerationClient {
    /// Build the client. A missing credential is not an error here; it is
    /// reported by every `generate` call before any request is made.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(GenerationError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.expose())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(GenerationError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| self.classify(e))?;
        let text = body.into_text();

        tracing::debug!(
            model = %self.config.model,
            chars = text.as_ref().map(String::len).unwrap_or(0),
            "Gemini generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

impl GeminiGenerationClient {
    fn classify(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            // Strip the URL: it carries the credential as a query parameter.
            GenerationError::Http(e.without_url())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
