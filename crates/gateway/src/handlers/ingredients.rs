//! Inventory handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::AppJson;
use crate::AppState;
use kitchenbuddy_common::{
    db::{models::UserIngredient, IngredientPatch, NewIngredient},
    errors::{AppError, Result},
};

/// Request to add an ingredient to the inventory
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(range(min = 0.0))]
    pub quantity: f64,

    #[validate(length(min = 1, max = 50))]
    pub unit: String,
}

/// Partial update; omitted fields keep their stored value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIngredientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(range(min = 0.0))]
    pub quantity: Option<f64>,

    #[validate(length(min = 1, max = 50))]
    pub unit: Option<String>,
}

#[derive(Serialize)]
pub struct CreateIngredientResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|field| field.to_string()),
    }
}

/// Add an ingredient
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<CreateIngredientResponse>)> {
    request.validate().map_err(validation_error)?;

    let ingredient = state
        .store
        .add_ingredient(NewIngredient {
            name: request.name.trim().to_string(),
            quantity: request.quantity,
            unit: request.unit.trim().to_string(),
        })
        .await?;

    tracing::info!(ingredient_id = %ingredient.id, "Ingredient added");

    Ok((
        StatusCode::CREATED,
        Json(CreateIngredientResponse {
            message: "Ingredient added successfully".to_string(),
            id: ingredient.id,
        }),
    ))
}

/// List the inventory
pub async fn list_ingredients(State(state): State<AppState>) -> Result<Json<Vec<UserIngredient>>> {
    let ingredients = state.store.list_ingredients().await?;
    Ok(Json(ingredients))
}

/// Merge a partial update into one ingredient
#[instrument(skip(state, request))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateIngredientRequest>,
) -> Result<Json<MessageResponse>> {
    // A malformed id can never match a stored ingredient
    let Ok(ingredient_id) = Uuid::parse_str(&id) else {
        return Err(AppError::IngredientNotFound { id });
    };

    request.validate().map_err(validation_error)?;

    let patch = IngredientPatch {
        name: request.name,
        quantity: request.quantity,
        unit: request.unit,
    };
    if patch.is_empty() {
        if state.store.get_ingredient(ingredient_id).await?.is_none() {
            return Err(AppError::IngredientNotFound { id });
        }
        return Err(AppError::Validation {
            message: "At least one of name, quantity or unit is required".to_string(),
            field: None,
        });
    }

    match state.store.update_ingredient(ingredient_id, patch).await? {
        Some(updated) => {
            tracing::info!(ingredient_id = %updated.id, "Ingredient updated");
            Ok(Json(MessageResponse {
                message: "Ingredient updated successfully".to_string(),
            }))
        }
        None => Err(AppError::IngredientNotFound { id }),
    }
}
