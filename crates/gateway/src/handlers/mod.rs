//! API handlers module

pub mod chat;
pub mod health;
pub mod ingredients;
pub mod recipes;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use kitchenbuddy_common::errors::AppError;

/// `Json` extractor whose rejections use the API error body
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation {
                message: rejection.body_text(),
                field: None,
            }),
        }
    }
}
