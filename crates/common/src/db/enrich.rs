//! Read-time join of recipes with their ingredient rows

use crate::db::models::{RecipeIngredientRow, StoredRecipe};
use crate::db::store::KitchenStore;
use crate::errors::Result;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A saved recipe together with its ingredient rows
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecipe {
    #[serde(flatten)]
    pub recipe: StoredRecipe,
    pub ingredients: Vec<RecipeIngredientRow>,
}

/// Attach to each recipe exactly the rows whose `recipe_id` matches.
///
/// Recipes without rows get an empty list. Rows keep their list position.
pub fn enrich_recipes(
    recipes: Vec<StoredRecipe>,
    rows: Vec<RecipeIngredientRow>,
) -> Vec<EnrichedRecipe> {
    let mut by_recipe: HashMap<Uuid, Vec<RecipeIngredientRow>> = HashMap::new();
    for row in rows {
        by_recipe.entry(row.recipe_id).or_default().push(row);
    }

    recipes
        .into_iter()
        .map(|recipe| {
            let mut ingredients = by_recipe.remove(&recipe.id).unwrap_or_default();
            ingredients.sort_by_key(|row| row.position);
            EnrichedRecipe { recipe, ingredients }
        })
        .collect()
}

/// Load every saved recipe with its ingredients
pub async fn load_enriched_recipes(store: &dyn KitchenStore) -> Result<Vec<EnrichedRecipe>> {
    let recipes = store.list_recipes().await?;
    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let rows = store.list_recipe_ingredients(&ids).await?;

    Ok(enrich_recipes(recipes, rows))
}
