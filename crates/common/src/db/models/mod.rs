//! SeaORM entity models
//!
//! Database entities for KitchenBuddy

mod recipe;
mod recipe_ingredient;
mod user_ingredient;

pub use recipe::{
    Entity as RecipeEntity,
    Model as StoredRecipe,
    ActiveModel as RecipeActiveModel,
    Column as RecipeColumn,
};

pub use recipe_ingredient::{
    Entity as RecipeIngredientEntity,
    Model as RecipeIngredientRow,
    ActiveModel as RecipeIngredientActiveModel,
    Column as RecipeIngredientColumn,
};

pub use user_ingredient::{
    Entity as UserIngredientEntity,
    Model as UserIngredient,
    ActiveModel as UserIngredientActiveModel,
    Column as UserIngredientColumn,
};
