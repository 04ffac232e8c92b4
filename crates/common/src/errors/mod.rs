//! Error types for KitchenBuddy services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses with a safe client-facing summary
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidInput,
    PayloadTooLarge,

    // Resource errors (4xxx)
    IngredientNotFound,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    ExtractionCallFailure,
    RetriesExhausted,
    ExtractionMalformed,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidInput => 1002,
            ErrorCode::PayloadTooLarge => 1004,

            // Resources (4xxx)
            ErrorCode::IngredientNotFound => 4001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // External (8xxx)
            ErrorCode::ExtractionCallFailure => 8001,
            ErrorCode::RetriesExhausted => 8002,
            ErrorCode::ExtractionMalformed => 8003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    // Resource errors
    #[error("Ingredient not found: {id}")]
    IngredientNotFound { id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Extraction service errors
    #[error("Extraction service call failed: {message}")]
    ExtractionCall {
        status: Option<u16>,
        message: String,
    },

    #[error("Extraction service still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Extraction response could not be parsed: {message}")]
    ExtractionMalformed { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidInput { .. } => ErrorCode::InvalidInput,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::IngredientNotFound { .. } => ErrorCode::IngredientNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::ExtractionCall { .. } => ErrorCode::ExtractionCallFailure,
            AppError::RetriesExhausted { .. } => ErrorCode::RetriesExhausted,
            AppError::ExtractionMalformed { .. } => ErrorCode::ExtractionMalformed,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::IngredientNotFound { .. } => StatusCode::NOT_FOUND,

            // 413 Payload Too Large
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::ExtractionCall { .. } |
            AppError::RetriesExhausted { .. } |
            AppError::ExtractionMalformed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing summary. Client errors echo their message; server
    /// errors never expose the underlying cause.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation { .. } |
            AppError::InvalidInput { .. } |
            AppError::PayloadTooLarge { .. } |
            AppError::IngredientNotFound { .. } => self.to_string(),
            AppError::ExtractionCall { .. } => {
                "The recipe extraction service rejected the request".to_string()
            }
            AppError::RetriesExhausted { .. } => {
                "The recipe extraction service is overloaded, try again later".to_string()
            }
            AppError::ExtractionMalformed { .. } => {
                "The recipe extraction service returned an unreadable recipe".to_string()
            }
            AppError::Database(_) | AppError::DatabaseConnection { .. } => {
                "The data store could not complete the request".to_string()
            }
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Build the response, optionally carrying the underlying cause in `details`
    pub fn into_response_with_details(self, include_details: bool) -> Response {
        let status = self.status_code();
        let code = self.code();
        let cause = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %cause,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %cause,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message: self.public_message(),
                details: include_details.then_some(cause),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with_details(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::IngredientNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::IngredientNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_input_is_client_error() {
        let err = AppError::InvalidInput {
            message: "No recipe text or file provided".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_extraction_failures_are_distinct() {
        let call = AppError::ExtractionCall { status: Some(400), message: "bad".into() };
        let exhausted = AppError::RetriesExhausted { attempts: 3 };
        let malformed = AppError::ExtractionMalformed { message: "eof".into() };

        for err in [&call, &exhausted, &malformed] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_ne!(call.code(), exhausted.code());
        assert_ne!(call.public_message(), exhausted.public_message());
        assert_ne!(exhausted.code().as_code(), malformed.code().as_code());
    }

    #[test]
    fn test_server_error_hides_cause() {
        let err = AppError::DatabaseConnection {
            message: "connection string with password".into()
        };
        assert!(err.is_server_error());
        assert!(!err.public_message().contains("password"));
    }

    #[tokio::test]
    async fn test_details_only_when_requested() {
        let err = AppError::ExtractionMalformed { message: "expected value".into() };
        let response = err.into_response_with_details(true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "EXTRACTION_MALFORMED");
        assert!(body["error"]["details"].as_str().unwrap().contains("expected value"));

        let response = AppError::RetriesExhausted { attempts: 3 }.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].get("details").is_none());
    }
}
