//! KitchenBuddy Common Library
//!
//! Shared code for the KitchenBuddy services including:
//! - Canonical recipe types
//! - Store abstraction with SeaORM and in-memory backends
//! - Extraction (generative AI) client abstraction and retry policy
//! - Error types and handling
//! - Configuration management
//! - Plain-text export
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod extraction;
pub mod metrics;
pub mod recipe;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{KitchenStore, MemoryStore, Repository};
pub use errors::{AppError, Result};
pub use extraction::{ExtractionClient, RetryPolicy};
pub use recipe::{Recipe, RecipeIngredient};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default extraction model
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-1.5-pro";

/// Upper bound for an uploaded recipe image (5 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
