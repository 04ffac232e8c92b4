//! KitchenBuddy Ingestion
//!
//! Turns recipe text, photos or pre-structured JSON into canonical recipes
//! via the extraction service, and answers recipe-suggestion chats.

pub mod normalizer;
pub mod parse;
pub mod pipeline;
pub mod suggestion;

pub use normalizer::{normalize, InputKind, NormalizedInput, RecipeSubmission, UploadedImage};
pub use parse::{parse_recipe, strip_code_fence};
pub use pipeline::IngestPipeline;
pub use suggestion::SuggestionService;
