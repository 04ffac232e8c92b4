//! Input normalization
//!
//! Collapses the three ways a recipe can be submitted into either a ready
//! extraction request or an already structured `Recipe`:
//!
//! | Kind       | Trigger                                   | Result                   |
//! |------------|-------------------------------------------|--------------------------|
//! | Image      | an uploaded file (wins over text)         | prompt + inline image    |
//! | Structured | text that already parses as a recipe      | `Recipe`, no extraction  |
//! | Text       | any other non-blank text                  | templated prompt         |

use crate::parse::try_parse_recipe;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kitchenbuddy_common::errors::{AppError, Result};
use kitchenbuddy_common::extraction::{ExtractionRequest, InlineMedia};
use kitchenbuddy_common::Recipe;

const TEXT_PROMPT_PREFIX: &str = "I have this recipe scattered, produce the recipe data for this: ";
const IMAGE_PROMPT: &str =
    "Extract the recipe information from this image and format it according to the schema:";

/// MIME type assumed for uploads that do not declare a usable one
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// An uploaded recipe photo, buffered in memory
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Raw recipe submission as received over HTTP
#[derive(Debug, Clone, Default)]
pub struct RecipeSubmission {
    pub text: Option<String>,
    pub image: Option<UploadedImage>,
}

impl RecipeSubmission {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Structured,
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Image => "image",
            InputKind::Structured => "structured",
            InputKind::Text => "text",
        }
    }
}

/// Outcome of normalization
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedInput {
    /// Needs a call to the extraction service
    Extract(ExtractionRequest),
    /// Already a complete recipe
    Structured(Recipe),
}

/// Normalize a submission. Fails with `InvalidInput` before any external call.
pub fn normalize(submission: RecipeSubmission) -> Result<(InputKind, NormalizedInput)> {
    if let Some(image) = submission.image {
        return normalize_image(image).map(|request| (InputKind::Image, NormalizedInput::Extract(request)));
    }

    let text = submission
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput {
            message: "Either recipeText or an image file is required".to_string(),
        })?;

    if let Some(recipe) = try_parse_recipe(text) {
        return Ok((InputKind::Structured, NormalizedInput::Structured(recipe)));
    }

    let prompt = format!("{}{}", TEXT_PROMPT_PREFIX, text);
    Ok((
        InputKind::Text,
        NormalizedInput::Extract(ExtractionRequest::recipe(prompt, None)),
    ))
}

fn normalize_image(image: UploadedImage) -> Result<ExtractionRequest> {
    tracing::debug!(
        file_name = image.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = image.bytes.len(),
        "Normalizing uploaded image"
    );

    if image.bytes.is_empty() {
        return Err(AppError::InvalidInput {
            message: "Uploaded file is empty".to_string(),
        });
    }

    let mime_type = image_mime_type(image.content_type.as_deref())?;
    let media = InlineMedia {
        mime_type,
        data: STANDARD.encode(&image.bytes),
    };

    Ok(ExtractionRequest::recipe(IMAGE_PROMPT, Some(media)))
}

fn image_mime_type(declared: Option<&str>) -> Result<String> {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    match declared.as_deref() {
        None | Some("application/octet-stream") => Ok(FALLBACK_IMAGE_MIME.to_string()),
        Some(ct) if ct.starts_with("image/") => Ok(ct.to_string()),
        Some(ct) => Err(AppError::InvalidInput {
            message: format!("Unsupported file type '{}', expected an image", ct),
        }),
    }
}
