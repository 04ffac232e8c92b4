//! Extraction service abstraction
//!
//! The extraction service is a generative model that turns recipe text or a
//! recipe photo into structured JSON, and answers free-form cooking questions.
//! Providers:
//! - Gemini (`generateContent` REST API)
//! - Fake (scripted responses, used for tests and `provider = "mock"`)

mod fake;
mod gemini;
mod retry;

pub use fake::FakeExtractor;
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

use crate::config::ExtractionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Error type for extraction calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Response could not be read: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ExtractionError {
    /// Only rate limiting is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::RateLimited { .. })
    }

    /// The call succeeded but the reply carried nothing usable
    pub fn is_malformed_reply(&self) -> bool {
        matches!(
            self,
            ExtractionError::EmptyResponse | ExtractionError::MalformedResponse(_)
        )
    }

    /// HTTP status reported by the service, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractionError::RateLimited { .. } => Some(429),
            ExtractionError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Media sent inline with the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineMedia {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
}

/// Shape requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// JSON constrained to the recipe schema
    RecipeJson,
    /// Unconstrained text
    FreeText,
}

/// One call to the extraction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub prompt: String,
    pub media: Option<InlineMedia>,
    pub format: ResponseFormat,
}

impl ExtractionRequest {
    pub fn recipe(prompt: impl Into<String>, media: Option<InlineMedia>) -> Self {
        Self {
            prompt: prompt.into(),
            media,
            format: ResponseFormat::RecipeJson,
        }
    }

    pub fn free_text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            media: None,
            format: ResponseFormat::FreeText,
        }
    }
}

/// Trait for extraction providers.
///
/// Implementations are stateless and thread-safe; they make one call per
/// `generate` and leave retrying to `RetryPolicy`.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Send the request and return the model's text response
    async fn generate(&self, request: &ExtractionRequest) -> Result<String, ExtractionError>;

    /// Get the provider name (e.g., "gemini", "fake")
    fn provider_name(&self) -> &'static str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an extraction client based on configuration
pub fn create_client(config: &ExtractionConfig) -> Result<Arc<dyn ExtractionClient>, ExtractionError> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| ExtractionError::NotConfigured("extraction.api_key not set".to_string()))?;
            Ok(Arc::new(GeminiClient::new(api_key, config)?))
        }
        "mock" => Ok(Arc::new(FakeExtractor::sample())),
        other => Err(ExtractionError::NotConfigured(format!(
            "Unknown provider: {}",
            other
        ))),
    }
}
