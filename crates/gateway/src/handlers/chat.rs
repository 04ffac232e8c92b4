//! Recipe suggestion chat

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::AppJson;
use crate::AppState;
use kitchenbuddy_common::errors::Result;

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestion: String,
}

#[instrument(skip(state, request))]
pub async fn recipe_suggestion(
    State(state): State<AppState>,
    AppJson(request): AppJson<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>> {
    let suggestion = state.suggestions.suggest(&request.message).await?;
    Ok(Json(SuggestionResponse { suggestion }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{body_json, send_json, test_app_with};
    use axum::http::{Method, StatusCode};
    use kitchenbuddy_common::extraction::FakeExtractor;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_message_is_400() {
        let (app, fake) = test_app_with(FakeExtractor::always("unused"));

        for body in [json!({}), json!({"message": "  "})] {
            let (status, error) =
                body_json(send_json(&app, Method::POST, "/chat/recipe-suggestion", body).await).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error["error"]["code"], "INVALID_INPUT");
        }
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_suggestion_uses_inventory() {
        let (app, fake) = test_app_with(FakeExtractor::always("Try a shakshuka.\n"));
        send_json(
            &app,
            Method::POST,
            "/ingredients",
            json!({"name": "Eggs", "quantity": 6, "unit": "pcs"}),
        )
        .await;

        let (status, body) = body_json(
            send_json(
                &app,
                Method::POST,
                "/chat/recipe-suggestion",
                json!({"message": "Something for brunch?"}),
            )
            .await,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestion"], "Try a shakshuka.");
        let prompt = &fake.requests()[0].prompt;
        assert!(prompt.contains("- 6 pcs Eggs"));
        assert!(prompt.contains("Something for brunch?"));
    }
}
