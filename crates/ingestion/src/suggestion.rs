//! Conversational recipe suggestions grounded in the user's kitchen

use kitchenbuddy_common::db::models::{StoredRecipe, UserIngredient};
use kitchenbuddy_common::errors::{AppError, Result};
use kitchenbuddy_common::extraction::{ExtractionClient, ExtractionRequest, RetryPolicy};
use kitchenbuddy_common::{metrics, KitchenStore};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

const ASSISTANT_PREAMBLE: &str = "You are a friendly kitchen assistant. Suggest what the user \
could cook, preferring the ingredients they have on hand and the recipes they have saved. \
Keep the answer short and practical.";

/// Answers free-form "what should I cook" questions
#[derive(Clone)]
pub struct SuggestionService {
    store: Arc<dyn KitchenStore>,
    client: Arc<dyn ExtractionClient>,
    retry: RetryPolicy,
}

impl SuggestionService {
    pub fn new(
        store: Arc<dyn KitchenStore>,
        client: Arc<dyn ExtractionClient>,
        retry: RetryPolicy,
    ) -> Self {
        Self { store, client, retry }
    }

    /// Suggest a recipe for `message`. A blank message is `InvalidInput`.
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn suggest(&self, message: &str) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidInput {
                message: "message is required".to_string(),
            });
        }

        let start = Instant::now();
        let result = self.generate(message).await;
        metrics::record_suggestion(start.elapsed().as_secs_f64(), result.is_ok());
        result
    }

    async fn generate(&self, message: &str) -> Result<String> {
        let (inventory, recipes) =
            futures::try_join!(self.store.list_ingredients(), self.store.list_recipes())?;

        let prompt = build_prompt(message, &inventory, &recipes);
        let request = ExtractionRequest::free_text(prompt);

        let reply = self.retry.run(|| self.client.generate(&request)).await?;

        info!(
            inventory = inventory.len(),
            saved_recipes = recipes.len(),
            "Suggestion generated"
        );

        Ok(reply.trim().to_string())
    }
}

fn build_prompt(message: &str, inventory: &[UserIngredient], recipes: &[StoredRecipe]) -> String {
    let mut prompt = String::from(ASSISTANT_PREAMBLE);

    prompt.push_str("\n\nIngredients on hand:\n");
    if inventory.is_empty() {
        prompt.push_str("- (none recorded)\n");
    }
    for item in inventory {
        let _ = writeln!(prompt, "- {} {} {}", item.quantity, item.unit, item.name);
    }

    prompt.push_str("\nSaved recipes:\n");
    if recipes.is_empty() {
        prompt.push_str("- (none saved)\n");
    }
    for recipe in recipes {
        let _ = writeln!(prompt, "- {}", recipe.name);
    }

    let _ = write!(prompt, "\nUser: {}", message);
    prompt
}
