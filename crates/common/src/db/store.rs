//! Store abstraction shared by the HTTP surface and the suggestion service

use crate::db::models::{RecipeIngredientRow, StoredRecipe, UserIngredient};
use crate::errors::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A new inventory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Partial update for an inventory entry. Only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl IngredientPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.unit.is_none()
    }

    /// Merge the supplied fields into an existing record
    pub fn apply_to(&self, ingredient: &mut UserIngredient) {
        if let Some(ref name) = self.name {
            ingredient.name = name.clone();
        }
        if let Some(quantity) = self.quantity {
            ingredient.quantity = quantity;
        }
        if let Some(ref unit) = self.unit {
            ingredient.unit = unit.clone();
        }
    }
}

/// Persistence gateway for inventory and recipes.
///
/// Implementations are injected as `Arc<dyn KitchenStore>`.
#[async_trait]
pub trait KitchenStore: Send + Sync {
    /// Add an inventory ingredient, stamping `last_updated`
    async fn add_ingredient(&self, ingredient: NewIngredient) -> Result<UserIngredient>;

    /// All inventory ingredients
    async fn list_ingredients(&self) -> Result<Vec<UserIngredient>>;

    /// One inventory ingredient, if it exists
    async fn get_ingredient(&self, id: Uuid) -> Result<Option<UserIngredient>>;

    /// Merge `patch` into the ingredient with `id`.
    ///
    /// Returns `None` when no such ingredient exists; nothing is written then.
    async fn update_ingredient(
        &self,
        id: Uuid,
        patch: IngredientPatch,
    ) -> Result<Option<UserIngredient>>;

    /// Persist a recipe together with its ingredient rows
    async fn save_recipe(&self, recipe: &Recipe) -> Result<StoredRecipe>;

    /// All saved recipes, oldest first
    async fn list_recipes(&self) -> Result<Vec<StoredRecipe>>;

    /// Ingredient rows for the given recipes, in list order
    async fn list_recipe_ingredients(&self, recipe_ids: &[Uuid]) -> Result<Vec<RecipeIngredientRow>>;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    /// Short backend identifier for logs
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sugar() -> UserIngredient {
        UserIngredient {
            id: Uuid::new_v4(),
            name: "Sugar".to_string(),
            quantity: 2.0,
            unit: "kg".to_string(),
            last_updated: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_patch_merges_only_supplied_fields() {
        let mut ingredient = sugar();
        let patch = IngredientPatch {
            quantity: Some(3.5),
            ..Default::default()
        };

        patch.apply_to(&mut ingredient);

        assert_eq!(ingredient.quantity, 3.5);
        assert_eq!(ingredient.name, "Sugar");
        assert_eq!(ingredient.unit, "kg");
    }

    #[test]
    fn test_empty_patch() {
        assert!(IngredientPatch::default().is_empty());
        let patch: IngredientPatch = serde_json::from_str(r#"{"unit": "g"}"#).unwrap();
        assert!(!patch.is_empty());
    }
}
