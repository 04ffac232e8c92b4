//! Repository pattern for database operations
//!
//! SeaORM-backed `KitchenStore`. A recipe and its ingredient rows are
//! written inside a single transaction, so a failed ingredient insert never
//! leaves an orphan recipe behind.

use crate::db::models::*;
use crate::db::store::{IngredientPatch, KitchenStore, NewIngredient};
use crate::db::DbPool;
use crate::errors::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

/// Recipe ids bound per ingredient-row query
const RECIPE_ID_BATCH: usize = 1000;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }
}

#[async_trait]
impl KitchenStore for Repository {
    // ========================================================================
    // Inventory Operations
    // ========================================================================

    async fn add_ingredient(&self, ingredient: NewIngredient) -> Result<UserIngredient> {
        let model = UserIngredientActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(ingredient.name),
            quantity: Set(ingredient.quantity),
            unit: Set(ingredient.unit),
            last_updated: Set(chrono::Utc::now().into()),
        };

        model.insert(self.conn()).await.map_err(Into::into)
    }

    async fn list_ingredients(&self) -> Result<Vec<UserIngredient>> {
        UserIngredientEntity::find()
            .order_by_asc(UserIngredientColumn::Name)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<UserIngredient>> {
        UserIngredientEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn update_ingredient(
        &self,
        id: Uuid,
        patch: IngredientPatch,
    ) -> Result<Option<UserIngredient>> {
        let Some(existing) = UserIngredientEntity::find_by_id(id).one(self.conn()).await? else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(quantity) = patch.quantity {
            model.quantity = Set(quantity);
        }
        if let Some(unit) = patch.unit {
            model.unit = Set(unit);
        }
        model.last_updated = Set(chrono::Utc::now().into());

        let updated = model.update(self.conn()).await?;
        Ok(Some(updated))
    }

    // ========================================================================
    // Recipe Operations
    // ========================================================================

    async fn save_recipe(&self, recipe: &Recipe) -> Result<StoredRecipe> {
        let recipe_id = Uuid::new_v4();
        let txn = self.conn().begin().await?;

        let stored = RecipeActiveModel {
            id: Set(recipe_id),
            name: Set(recipe.name.clone()),
            description: Set(recipe.description.clone()),
            taste: Set(recipe.taste.clone()),
            cuisine: Set(recipe.cuisine.clone()),
            prep_time: Set(recipe.prep_time),
            steps: Set(recipe.steps.clone()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        if !recipe.ingredients.is_empty() {
            let rows = recipe.ingredients.iter().enumerate().map(|(position, ingredient)| {
                RecipeIngredientActiveModel {
                    id: Set(Uuid::new_v4()),
                    recipe_id: Set(recipe_id),
                    position: Set(position as i32),
                    name: Set(ingredient.name.clone()),
                    quantity_required: Set(ingredient.quantity_required),
                    unit: Set(ingredient.unit.clone()),
                }
            });

            RecipeIngredientEntity::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;

        tracing::debug!(
            recipe_id = %recipe_id,
            ingredients = recipe.ingredients.len(),
            "Recipe stored"
        );

        Ok(stored)
    }

    async fn list_recipes(&self) -> Result<Vec<StoredRecipe>> {
        RecipeEntity::find()
            .order_by_asc(RecipeColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn list_recipe_ingredients(&self, recipe_ids: &[Uuid]) -> Result<Vec<RecipeIngredientRow>> {
        let mut rows = Vec::new();

        // Postgres caps a statement at 65,535 bind parameters
        for batch in recipe_ids.chunks(RECIPE_ID_BATCH) {
            let found = RecipeIngredientEntity::find()
                .filter(RecipeIngredientColumn::RecipeId.is_in(batch.iter().copied()))
                .order_by_asc(RecipeIngredientColumn::RecipeId)
                .order_by_asc(RecipeIngredientColumn::Position)
                .all(self.conn())
                .await?;
            rows.extend(found);
        }

        Ok(rows)
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
