//! Ingestion pipeline
//!
//! normalize -> extraction call (with rate-limit backoff) -> parse. The
//! pipeline holds no per-request state; persisting the result is left to the
//! caller.

use crate::normalizer::{normalize, NormalizedInput, RecipeSubmission};
use crate::parse::parse_recipe;
use kitchenbuddy_common::errors::Result;
use kitchenbuddy_common::extraction::{ExtractionClient, ExtractionRequest, RetryPolicy};
use kitchenbuddy_common::{metrics, Recipe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Turns recipe submissions into structured recipes
#[derive(Clone)]
pub struct IngestPipeline {
    client: Arc<dyn ExtractionClient>,
    retry: RetryPolicy,
}

impl IngestPipeline {
    pub fn new(client: Arc<dyn ExtractionClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Run one submission through normalization, extraction and parsing
    #[instrument(skip(self, submission), fields(kind))]
    pub async fn ingest(&self, submission: RecipeSubmission) -> Result<Recipe> {
        let start = Instant::now();
        let (kind, normalized) = normalize(submission)?;
        tracing::Span::current().record("kind", kind.as_str());

        let result = match normalized {
            NormalizedInput::Structured(recipe) => {
                debug!("Submission is already a structured recipe");
                Ok(recipe)
            }
            NormalizedInput::Extract(request) => self.extract(&request).await,
        };

        metrics::record_ingestion(start.elapsed().as_secs_f64(), kind.as_str(), result.is_ok());

        if let Ok(ref recipe) = result {
            info!(
                recipe = %recipe.name,
                ingredients = recipe.ingredients.len(),
                "Recipe extracted"
            );
        }

        result
    }

    /// Call the extraction service under the retry policy and parse the reply.
    ///
    /// A reply that fails to parse is returned as `ExtractionMalformed`
    /// straight away; only the call itself is retried.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Recipe> {
        debug!(
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            has_media = request.media.is_some(),
            "Calling extraction service"
        );

        let raw = self.retry.run(|| self.client.generate(request)).await?;
        parse_recipe(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::UploadedImage;
    use kitchenbuddy_common::errors::AppError;
    use kitchenbuddy_common::extraction::{ExtractionError, FakeExtractor};
    use std::time::Duration;
    use tokio::time::Instant as TestInstant;

    const PANCAKES: &str = r#"{"name":"Pancakes","description":"Breakfast","prep_time":15,"steps":"Mix and fry","ingredients":[{"name":"Milk","quantity_required":250,"unit":"ml"}]}"#;

    fn pipeline(fake: &Arc<FakeExtractor>) -> IngestPipeline {
        IngestPipeline::new(fake.clone(), RetryPolicy::default())
    }

    fn rate_limited() -> std::result::Result<String, ExtractionError> {
        Err(ExtractionError::RateLimited { retry_after_secs: None })
    }

    #[tokio::test]
    async fn test_text_submission_is_extracted() {
        let fake = Arc::new(FakeExtractor::always(format!("```json\n{}\n```", PANCAKES)));

        let recipe = pipeline(&fake)
            .ingest(RecipeSubmission::from_text("milk, flour, eggs"))
            .await
            .unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.ingredients[0].unit, "ml");
        assert_eq!(fake.calls(), 1);
        assert!(fake.requests()[0].prompt.ends_with("milk, flour, eggs"));
    }

    #[tokio::test]
    async fn test_image_submission_sends_media() {
        let fake = Arc::new(FakeExtractor::always(PANCAKES));
        let submission = RecipeSubmission {
            text: None,
            image: Some(UploadedImage {
                bytes: vec![1, 2, 3],
                content_type: Some("image/png".to_string()),
                file_name: None,
            }),
        };

        pipeline(&fake).ingest(submission).await.unwrap();

        let media = fake.requests()[0].media.clone().unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, "AQID");
    }

    #[tokio::test]
    async fn test_structured_submission_makes_no_call() {
        let fake = Arc::new(FakeExtractor::default());

        let recipe = pipeline(&fake)
            .ingest(RecipeSubmission::from_text(PANCAKES))
            .await
            .unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_call() {
        let fake = Arc::new(FakeExtractor::sample());

        let result = pipeline(&fake).ingest(RecipeSubmission::default()).await;

        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_below_cap_recover() {
        for (limited, expected_wait) in [(0, 0), (1, 1), (2, 3)] {
            let fake = Arc::new(FakeExtractor::rate_limited_then(limited, PANCAKES));
            let start = TestInstant::now();

            let recipe = pipeline(&fake)
                .ingest(RecipeSubmission::from_text("pancakes"))
                .await
                .unwrap();

            let waited = start.elapsed();
            assert_eq!(recipe.name, "Pancakes");
            assert_eq!(fake.calls(), limited + 1);
            assert!(waited >= Duration::from_secs(expected_wait));
            assert!(waited < Duration::from_secs(expected_wait) + Duration::from_millis(50));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_rate_limits_exhaust_retries() {
        let fake = Arc::new(FakeExtractor::scripted([
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Ok(PANCAKES.to_string()),
        ]));
        let start = TestInstant::now();

        let result = pipeline(&fake)
            .ingest(RecipeSubmission::from_text("pancakes"))
            .await;

        assert!(matches!(result, Err(AppError::RetriesExhausted { attempts: 3 })));
        assert_eq!(fake.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_failure_is_not_retried() {
        let fake = Arc::new(FakeExtractor::scripted([
            Err(ExtractionError::Api {
                status: 500,
                message: "internal".to_string(),
            }),
            Ok(PANCAKES.to_string()),
        ]));

        let result = pipeline(&fake)
            .ingest(RecipeSubmission::from_text("pancakes"))
            .await;

        assert!(matches!(result, Err(AppError::ExtractionCall { status: Some(500), .. })));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_retried() {
        let fake = Arc::new(FakeExtractor::scripted([
            Ok("I could not find a recipe.".to_string()),
            Ok(PANCAKES.to_string()),
        ]));

        let result = pipeline(&fake)
            .ingest(RecipeSubmission::from_text("pancakes"))
            .await;

        assert!(matches!(result, Err(AppError::ExtractionMalformed { .. })));
        assert_eq!(fake.calls(), 1);
    }
}
