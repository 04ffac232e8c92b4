//! Plain-text export of saved recipes

use crate::db::EnrichedRecipe;
use std::fmt::Write;

/// Line written between two recipe blocks
pub const RECIPE_SEPARATOR: &str = "----------------------------------------";

/// File name offered to clients downloading the export
pub const EXPORT_FILE_NAME: &str = "recipes.txt";

/// Flatten recipes into one text block each.
///
/// Block layout: name, description, cuisine, taste, prep time, ingredient
/// lines, steps. Missing cuisine or taste is written as `N/A`.
pub fn format_recipe_export(recipes: &[EnrichedRecipe]) -> String {
    let blocks: Vec<String> = recipes.iter().map(format_block).collect();
    blocks.join(&format!("\n{}\n\n", RECIPE_SEPARATOR))
}

fn format_block(enriched: &EnrichedRecipe) -> String {
    let recipe = &enriched.recipe;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Recipe: {}", recipe.name);
    let _ = writeln!(out, "Description: {}", recipe.description);
    let _ = writeln!(out, "Cuisine: {}", recipe.cuisine.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "Taste: {}", recipe.taste.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "Prep Time: {} minutes", recipe.prep_time);

    out.push_str("Ingredients:\n");
    for row in &enriched.ingredients {
        if row.unit.is_empty() {
            let _ = writeln!(out, "- {} {}", row.quantity_required, row.name);
        } else {
            let _ = writeln!(out, "- {} {} {}", row.quantity_required, row.unit, row.name);
        }
    }

    out.push_str("Steps:\n");
    out.push_str(recipe.steps.trim_end());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{RecipeIngredientRow, StoredRecipe};
    use uuid::Uuid;

    fn enriched(name: &str, cuisine: Option<&str>, rows: &[(&str, f64, &str)]) -> EnrichedRecipe {
        let id = Uuid::new_v4();
        EnrichedRecipe {
            recipe: StoredRecipe {
                id,
                name: name.to_string(),
                description: "Tasty".to_string(),
                taste: None,
                cuisine: cuisine.map(str::to_string),
                prep_time: 20.0,
                steps: "Mix.\nBake.".to_string(),
                created_at: chrono::Utc::now().into(),
            },
            ingredients: rows
                .iter()
                .enumerate()
                .map(|(i, (name, qty, unit))| RecipeIngredientRow {
                    id: Uuid::new_v4(),
                    recipe_id: id,
                    position: i as i32,
                    name: name.to_string(),
                    quantity_required: *qty,
                    unit: unit.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_block_field_order() {
        let text = format_recipe_export(&[enriched(
            "Cake",
            Some("French"),
            &[("Flour", 250.0, "g"), ("Egg", 2.0, "")],
        )]);

        assert_eq!(
            text,
            "Recipe: Cake\n\
             Description: Tasty\n\
             Cuisine: French\n\
             Taste: N/A\n\
             Prep Time: 20 minutes\n\
             Ingredients:\n\
             - 250 g Flour\n\
             - 2 Egg\n\
             Steps:\n\
             Mix.\n\
             Bake.\n"
        );
    }

    #[test]
    fn test_one_block_per_recipe() {
        let text = format_recipe_export(&[
            enriched("Soup", None, &[]),
            enriched("Bread", None, &[("Yeast", 0.5, "tsp")]),
        ]);

        assert_eq!(text.matches(RECIPE_SEPARATOR).count(), 1);
        assert_eq!(text.matches("Recipe: ").count(), 2);
        assert!(text.find("Recipe: Soup").unwrap() < text.find("Recipe: Bread").unwrap());
        assert!(text.contains("- 0.5 tsp Yeast"));
    }

    #[test]
    fn test_empty_export() {
        assert_eq!(format_recipe_export(&[]), "");
    }
}
