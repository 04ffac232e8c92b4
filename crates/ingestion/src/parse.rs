//! Turning extraction service output into a `Recipe`

use kitchenbuddy_common::errors::{AppError, Result};
use kitchenbuddy_common::Recipe;
use regex_lite::Regex;
use std::sync::LazyLock;

/// A whole-body markdown fence, optionally language tagged (```json ... ```)
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```[\w-]*[ \t]*\r?\n?(?s:(.*?))\s*```$").expect("fence pattern is valid")
});

/// Strip a markdown code fence wrapping the whole input.
///
/// Input without a surrounding fence is returned trimmed and otherwise
/// untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Parse extraction output, fenced or not, into a `Recipe`.
///
/// Any failure is `ExtractionMalformed`; callers must not retry it.
pub fn parse_recipe(raw: &str) -> Result<Recipe> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, response_len = raw.len(), "Extraction response is not a recipe");
        AppError::ExtractionMalformed {
            message: e.to_string(),
        }
    })
}

/// Parse text that may already be a complete recipe, without logging misses
pub(crate) fn try_parse_recipe(text: &str) -> Option<Recipe> {
    let body = strip_code_fence(text);
    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str(body).ok()
}
