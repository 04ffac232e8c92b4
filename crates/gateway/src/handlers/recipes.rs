//! Recipe handlers: ingestion, listing and plain-text export

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::AppJson;
use crate::AppState;
use kitchenbuddy_common::{
    db::{load_enriched_recipes, EnrichedRecipe},
    errors::{AppError, Result},
    export::{format_recipe_export, EXPORT_FILE_NAME},
    Recipe,
};
use kitchenbuddy_ingestion::{RecipeSubmission, UploadedImage};

/// Multipart field carrying the recipe photo
const FILE_FIELD: &str = "file";
/// Multipart field or JSON key carrying recipe text
const TEXT_FIELD: &str = "recipeText";

/// JSON body accepted by `POST /recipes`
#[derive(Debug, Default, Deserialize)]
pub struct RecipeTextRequest {
    #[serde(rename = "recipeText", default)]
    pub recipe_text: Option<String>,
}

#[derive(Serialize)]
pub struct CreateRecipeResponse {
    pub message: String,
    pub recipe_id: Uuid,
    pub recipe: Recipe,
}

/// A recipe submission read from either a multipart form or a JSON body.
///
/// Uploaded files are buffered in memory and capped at
/// `upload.max_file_bytes`.
pub struct RecipeForm(pub RecipeSubmission);

impl FromRequest<AppState> for RecipeForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let AppJson(body) = AppJson::<RecipeTextRequest>::from_request(req, state).await?;
            return Ok(Self(RecipeSubmission {
                text: body.recipe_text,
                image: None,
            }));
        }

        let limit = state.config.upload.max_file_bytes;
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput {
                message: rejection.body_text(),
            })?;

        let mut submission = RecipeSubmission::default();
        while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
            match field.name() {
                Some(FILE_FIELD) => {
                    let content_type = field.content_type().map(str::to_string);
                    let file_name = field.file_name().map(str::to_string);

                    let mut bytes = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
                        if bytes.len() + chunk.len() > limit {
                            return Err(AppError::PayloadTooLarge {
                                size: bytes.len() + chunk.len(),
                                limit,
                            });
                        }
                        bytes.extend_from_slice(&chunk);
                    }

                    // An untouched file input still posts an empty, unnamed part
                    if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                        tracing::debug!("Ignoring empty file field");
                        continue;
                    }

                    submission.image = Some(UploadedImage {
                        bytes,
                        content_type,
                        file_name,
                    });
                }
                Some(TEXT_FIELD) => {
                    let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                    submission.text = Some(text);
                }
                _ => {}
            }
        }

        Ok(Self(submission))
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { size: limit + 1, limit }
    } else {
        AppError::InvalidInput {
            message: format!("Failed to read multipart data: {}", e.body_text()),
        }
    }
}

/// Ingest a recipe from text, a photo or pre-structured JSON and store it.
///
/// Failures on this route carry the underlying cause in `details`.
#[instrument(skip(state, form))]
pub async fn create_recipe(State(state): State<AppState>, form: Result<RecipeForm>) -> Response {
    match ingest_and_store(&state, form).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response_with_details(true),
    }
}

async fn ingest_and_store(state: &AppState, form: Result<RecipeForm>) -> Result<CreateRecipeResponse> {
    let RecipeForm(submission) = form?;

    let recipe = state.pipeline.ingest(submission).await?;
    let stored = state.store.save_recipe(&recipe).await?;

    tracing::info!(recipe_id = %stored.id, name = %stored.name, "Recipe saved");

    Ok(CreateRecipeResponse {
        message: "Recipe added successfully".to_string(),
        recipe_id: stored.id,
        recipe,
    })
}

/// All saved recipes, each with its ingredient rows
pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<EnrichedRecipe>>> {
    let recipes = load_enriched_recipes(state.store.as_ref()).await?;
    Ok(Json(recipes))
}

/// Every saved recipe flattened into a downloadable text file
pub async fn download_recipes(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let recipes = load_enriched_recipes(state.store.as_ref()).await?;
    let body = format_recipe_export(&recipes);

    tracing::debug!(recipes = recipes.len(), bytes = body.len(), "Recipe export built");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{
        body_json, body_text, get, send_json, send_multipart, test_app, test_app_with,
    };
    use axum::http::{header, Method, StatusCode};
    use kitchenbuddy_common::extraction::{ExtractionError, FakeExtractor};
    use kitchenbuddy_common::DEFAULT_MAX_UPLOAD_BYTES;
    use serde_json::json;

    #[tokio::test]
    async fn test_neither_input_is_400_without_call_or_write() {
        let (app, fake) = test_app();

        let (status, body) = body_json(send_json(&app, Method::POST, "/recipes", json!({})).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");

        let (status, _) = body_json(send_multipart(&app, "/recipes", &[("other", None, b"x".as_slice())]).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(fake.calls(), 0);
        let (_, listed) = body_json(get(&app, "/recipes").await).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_text_recipe_is_ingested_and_listed() {
        let (app, fake) = test_app();

        let (status, created) = body_json(
            send_json(&app, Method::POST, "/recipes", json!({"recipeText": "pasta with tomatoes"})).await,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["recipe"]["name"], "Tomato Pasta");
        assert_eq!(fake.calls(), 1);

        let (status, listed) = body_json(get(&app, "/recipes").await).await;
        assert_eq!(status, StatusCode::OK);
        let recipes = listed.as_array().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["id"], created["recipe_id"]);
        let names: Vec<_> = recipes[0]["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Spaghetti", "Tomato", "Garlic"]);
        assert!(recipes[0]["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row["recipe_id"] == created["recipe_id"]));
    }

    #[tokio::test]
    async fn test_multipart_image_is_sent_inline() {
        let (app, fake) = test_app();

        let (status, _) = body_json(
            send_multipart(
                &app,
                "/recipes",
                &[
                    ("recipeText", None, b"ignored when a photo is present".as_slice()),
                    ("file", Some(("card.png", "image/png")), b"hello".as_slice()),
                ],
            )
            .await,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let request = &fake.requests()[0];
        let media = request.media.as_ref().unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, "aGVsbG8=");
        assert!(request.prompt.starts_with("Extract the recipe information from this image"));
    }

    #[tokio::test]
    async fn test_empty_file_field_falls_back_to_text() {
        let (app, fake) = test_app();

        let (status, created) = body_json(
            send_multipart(
                &app,
                "/recipes",
                &[
                    ("recipeText", None, b"2 eggs, whisk, fry".as_slice()),
                    ("file", Some(("", "application/octet-stream")), b"".as_slice()),
                ],
            )
            .await,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["recipe"]["name"], "Tomato Pasta");
        let request = &fake.requests()[0];
        assert!(request.media.is_none());
        assert!(request.prompt.ends_with("2 eggs, whisk, fry"));
    }

    #[tokio::test]
    async fn test_named_empty_file_is_400() {
        let (app, fake) = test_app();

        let (status, body) = body_json(
            send_multipart(&app, "/recipes", &[("file", Some(("card.png", "image/png")), b"".as_slice())]).await,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_is_413() {
        let (app, fake) = test_app();
        let big = vec![0u8; DEFAULT_MAX_UPLOAD_BYTES + 1];

        let (status, body) = body_json(
            send_multipart(&app, "/recipes", &[("file", Some(("big.jpg", "image/jpeg")), big.as_slice())]).await,
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_failure_carries_details() {
        let (app, _) = test_app_with(FakeExtractor::scripted([Err::<String, _>(ExtractionError::Api {
            status: 400,
            message: "API key not valid".to_string(),
        })]));

        let (status, body) = body_json(
            send_json(&app, Method::POST, "/recipes", json!({"recipeText": "soup"})).await,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "EXTRACTION_CALL_FAILURE");
        assert!(body["error"]["details"].as_str().unwrap().contains("API key not valid"));

        let (_, listed) = body_json(get(&app, "/recipes").await).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_blocked_reply_is_malformed_not_call_failure() {
        let (app, fake) = test_app_with(FakeExtractor::scripted([Err::<String, _>(
            ExtractionError::EmptyResponse,
        )]));

        let (status, body) = body_json(
            send_json(&app, Method::POST, "/recipes", json!({"recipeText": "soup"})).await,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "EXTRACTION_MALFORMED");
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_download_export() {
        let (app, _) = test_app();
        send_json(&app, Method::POST, "/recipes", json!({"recipeText": "pasta"})).await;
        send_json(&app, Method::POST, "/recipes", json!({"recipeText": "more pasta"})).await;

        let (status, headers, text) = body_text(get(&app, "/recipes/download").await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"recipes.txt\""
        );
        assert_eq!(text.matches("Recipe: Tomato Pasta").count(), 2);

        let first_block = text.split("----").next().unwrap();
        let order: Vec<usize> = [
            "Recipe:",
            "Description:",
            "Cuisine: Italian",
            "Taste: Savory",
            "Prep Time: 25 minutes",
            "Ingredients:",
            "- 200 g Spaghetti",
            "Steps:",
        ]
        .iter()
        .map(|label| first_block.find(label).unwrap())
        .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
