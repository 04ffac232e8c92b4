//! Canonical recipe shape produced by ingestion

use serde::{Deserialize, Deserializer, Serialize};

/// A recipe as returned by the extraction service.
///
/// `created_at` is not part of this type; it is assigned when the recipe is
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    /// Minutes
    pub prep_time: f64,

    #[serde(deserialize_with = "text_or_lines")]
    pub steps: String,

    #[serde(deserialize_with = "one_or_many")]
    pub ingredients: Vec<RecipeIngredient>,
}

/// One line of a recipe's ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,

    #[serde(default)]
    pub quantity_required: f64,

    #[serde(default)]
    pub unit: String,
}

/// Older generation schemas declared `ingredients` as a single object.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<RecipeIngredient>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<RecipeIngredient>),
        One(RecipeIngredient),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

fn text_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrLines {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match TextOrLines::deserialize(deserializer)? {
        TextOrLines::Text(text) => text,
        TextOrLines::Lines(lines) => lines.join("\n"),
    })
}
