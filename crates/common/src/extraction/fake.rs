//! Fake extraction provider for testing.
//!
//! Replays a scripted queue of results, then falls back to a default
//! response. Every request is recorded so tests can assert on call counts
//! and prompt contents without network access.

use super::{ExtractionClient, ExtractionError, ExtractionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Recipe JSON returned by `FakeExtractor::sample`
pub const SAMPLE_RECIPE_JSON: &str = r#"{
  "name": "Tomato Pasta",
  "description": "Weeknight pasta with a quick tomato sauce",
  "taste": "Savory",
  "cuisine": "Italian",
  "prep_time": 25,
  "steps": "Boil the pasta. Simmer tomatoes with garlic. Toss together.",
  "ingredients": [
    {"name": "Spaghetti", "quantity_required": 200, "unit": "g"},
    {"name": "Tomato", "quantity_required": 4, "unit": "pcs"},
    {"name": "Garlic", "quantity_required": 2, "unit": "cloves"}
  ]
}"#;

#[derive(Debug, Default)]
struct FakeState {
    script: VecDeque<Result<String, ExtractionError>>,
    requests: Vec<ExtractionRequest>,
}

/// A fake extraction provider for testing.
#[derive(Debug, Default)]
pub struct FakeExtractor {
    state: Mutex<FakeState>,
    /// Returned once the script is exhausted; `None` yields `EmptyResponse`
    default_response: Option<String>,
}

impl FakeExtractor {
    /// Replay `script` in order, then report an empty response
    pub fn scripted(script: impl IntoIterator<Item = Result<String, ExtractionError>>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                script: script.into_iter().collect(),
                requests: Vec::new(),
            }),
            default_response: None,
        }
    }

    /// Always answer with `response`
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            state: Mutex::default(),
            default_response: Some(response.into()),
        }
    }

    /// Always answer with a well-formed recipe
    pub fn sample() -> Self {
        Self::always(SAMPLE_RECIPE_JSON)
    }

    /// Answer with `response` after `count` rate-limit rejections
    pub fn rate_limited_then(count: usize, response: impl Into<String>) -> Self {
        let script = (0..count)
            .map(|_| Err(ExtractionError::RateLimited { retry_after_secs: None }))
            .chain(std::iter::once(Ok(response.into())));
        Self::scripted(script)
    }

    /// Number of `generate` calls made so far
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Every request received, oldest first
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExtractionClient for FakeExtractor {
    async fn generate(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        match state.script.pop_front() {
            Some(result) => result,
            None => self
                .default_response
                .clone()
                .ok_or(ExtractionError::EmptyResponse),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
