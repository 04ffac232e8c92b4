//! Gemini `generateContent` provider.

use super::{ExtractionClient, ExtractionError, ExtractionRequest, ResponseFormat};
use crate::config::ExtractionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API provider.
#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationConfig,
    client: reqwest::Client,
}

/// Sampling parameters sent with every call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Error response from Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// Schema the service must fill for `ResponseFormat::RecipeJson`
pub(crate) fn recipe_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "description": { "type": "string" },
            "taste": { "type": "string" },
            "cuisine": { "type": "string" },
            "prep_time": { "type": "number" },
            "steps": { "type": "string" },
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "quantity_required": { "type": "number" },
                        "unit": { "type": "string" }
                    },
                    "required": ["name", "quantity_required", "unit"]
                }
            }
        },
        "required": ["name", "description", "prep_time", "steps", "ingredients"]
    })
}

impl GeminiClient {
    /// Create a new GeminiClient from the extraction configuration
    pub fn new(api_key: String, config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            generation: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
                response_mime_type: None,
                response_schema: None,
            },
            client,
        })
    }

    fn build_body(&self, request: &ExtractionRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(ref media) = request.media {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: media.mime_type.clone(),
                    data: media.data.clone(),
                },
            });
        }

        let mut generation = self.generation.clone();
        if request.format == ResponseFormat::RecipeJson {
            generation.response_mime_type = Some("application/json".to_string());
            generation.response_schema = Some(recipe_response_schema());
        }

        GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: generation,
        }
    }
}

#[async_trait]
impl ExtractionClient for GeminiClient {
    async fn generate(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| ExtractionError::RequestFailed(e.without_url().to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ExtractionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::RequestFailed(e.without_url().to_string()))?;

        if !(200..300).contains(&status) {
            // Try to parse error response
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(ExtractionError::Api {
                    status,
                    message: error_response.error.message,
                });
            }
            return Err(ExtractionError::Api {
                status,
                message: body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractionError::MalformedResponse(format!("unexpected response body: {}", e)))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(ExtractionError::EmptyResponse);
        };
        let finish_reason = candidate.finish_reason;
        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            tracing::warn!(finish_reason = ?finish_reason, "Gemini candidate carried no text");
            return Err(ExtractionError::EmptyResponse);
        }

        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
