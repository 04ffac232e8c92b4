//! In-process `KitchenStore` for local runs and tests

use crate::db::models::{RecipeIngredientRow, StoredRecipe, UserIngredient};
use crate::db::store::{IngredientPatch, KitchenStore, NewIngredient};
use crate::errors::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    ingredients: Vec<UserIngredient>,
    recipes: Vec<StoredRecipe>,
    recipe_ingredients: Vec<RecipeIngredientRow>,
}

/// Store kept entirely in memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KitchenStore for MemoryStore {
    async fn add_ingredient(&self, ingredient: NewIngredient) -> Result<UserIngredient> {
        let record = UserIngredient {
            id: Uuid::new_v4(),
            name: ingredient.name,
            quantity: ingredient.quantity,
            unit: ingredient.unit,
            last_updated: chrono::Utc::now().into(),
        };

        self.state.write().await.ingredients.push(record.clone());
        Ok(record)
    }

    async fn list_ingredients(&self) -> Result<Vec<UserIngredient>> {
        Ok(self.state.read().await.ingredients.clone())
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<UserIngredient>> {
        let state = self.state.read().await;
        Ok(state.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn update_ingredient(
        &self,
        id: Uuid,
        patch: IngredientPatch,
    ) -> Result<Option<UserIngredient>> {
        let mut state = self.state.write().await;
        let Some(ingredient) = state.ingredients.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };

        patch.apply_to(ingredient);
        ingredient.last_updated = chrono::Utc::now().into();
        Ok(Some(ingredient.clone()))
    }

    async fn save_recipe(&self, recipe: &Recipe) -> Result<StoredRecipe> {
        let stored = StoredRecipe {
            id: Uuid::new_v4(),
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            taste: recipe.taste.clone(),
            cuisine: recipe.cuisine.clone(),
            prep_time: recipe.prep_time,
            steps: recipe.steps.clone(),
            created_at: chrono::Utc::now().into(),
        };

        let rows = recipe
            .ingredients
            .iter()
            .enumerate()
            .map(|(position, ingredient)| RecipeIngredientRow {
                id: Uuid::new_v4(),
                recipe_id: stored.id,
                position: position as i32,
                name: ingredient.name.clone(),
                quantity_required: ingredient.quantity_required,
                unit: ingredient.unit.clone(),
            });

        // Both writes land under one lock
        let mut state = self.state.write().await;
        state.recipes.push(stored.clone());
        state.recipe_ingredients.extend(rows);

        Ok(stored)
    }

    async fn list_recipes(&self) -> Result<Vec<StoredRecipe>> {
        Ok(self.state.read().await.recipes.clone())
    }

    async fn list_recipe_ingredients(&self, recipe_ids: &[Uuid]) -> Result<Vec<RecipeIngredientRow>> {
        let state = self.state.read().await;
        Ok(state
            .recipe_ingredients
            .iter()
            .filter(|row| recipe_ids.contains(&row.recipe_id))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
