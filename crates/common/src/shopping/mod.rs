//! Shopping-list aggregation and report rendering
//!
//! Pure logic: the handler fetches the cart's ingredient rows and recipe
//! list, this module groups, sums, sorts, and renders. The timestamp is
//! injected by the caller so rendering stays deterministic under test.

use crate::db::IngredientRow;
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

/// One grouped line of the shopping list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedIngredient {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// A recipe contributing to the shopping list
#[derive(Debug, Clone)]
pub struct ReportRecipe {
    pub name: String,
    pub author: String,
}

/// Group the cart's ingredient rows by (name, measurement unit) and sum the
/// amounts. Output is sorted by ingredient name, unit as tie-break.
pub fn aggregate(rows: &[IngredientRow]) -> Vec<AggregatedIngredient> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for row in rows {
        let key = (
            row.ingredient.name.clone(),
            row.ingredient.measurement_unit.clone(),
        );
        *totals.entry(key).or_insert(0) += i64::from(row.entry.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| AggregatedIngredient {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Render the downloadable plain-text report.
///
/// An empty cart still renders a complete report with an explicit
/// "no items" line, so clients can treat the download as idempotent.
pub fn render_report(
    username: &str,
    generated_at: DateTime<Utc>,
    items: &[AggregatedIngredient],
    recipes: &[ReportRecipe],
) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Foodgram shopping list | {}",
        generated_at.format("%d.%m.%Y %H:%M")
    ));
    lines.push(format!("User: {}", username));
    lines.push(String::new());
    lines.push("Ingredients:".to_string());

    if items.is_empty() {
        lines.push("No items in the shopping cart.".to_string());
    } else {
        for (n, item) in items.iter().enumerate() {
            lines.push(format!(
                "{}. {} — {} {}",
                n + 1,
                capitalize(&item.name),
                item.total,
                item.measurement_unit
            ));
        }
    }

    lines.push(String::new());
    lines.push("Recipes:".to_string());
    for recipe in recipes {
        lines.push(format!("- {} (author: {})", recipe.name, recipe.author));
    }

    lines.push(String::new());
    lines.push(format!("(c) Foodgram {}", generated_at.year()));

    lines.join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Ingredient, IngredientInRecipe};
    use chrono::TimeZone;

    fn row(id: i64, recipe_id: i64, name: &str, unit: &str, amount: i32) -> IngredientRow {
        IngredientRow {
            entry: IngredientInRecipe {
                id,
                recipe_id,
                ingredient_id: id,
                amount,
            },
            ingredient: Ingredient {
                id,
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            },
        }
    }

    #[test]
    fn test_same_ingredient_across_recipes_is_summed() {
        // Two cart recipes both containing salt: 5 g + 3 g = one 8 g line
        let rows = vec![row(1, 10, "salt", "g", 5), row(2, 11, "salt", "g", 3)];

        let items = aggregate(&rows);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "salt");
        assert_eq!(items[0].total, 8);
        assert_eq!(items[0].measurement_unit, "g");
    }

    #[test]
    fn test_different_units_stay_separate() {
        let rows = vec![row(1, 10, "milk", "ml", 200), row(2, 11, "milk", "l", 1)];

        let items = aggregate(&rows);
        assert_eq!(items.len(), 2);
        // Same name: unit is the tie-break
        assert_eq!(items[0].measurement_unit, "l");
        assert_eq!(items[1].measurement_unit, "ml");
    }

    #[test]
    fn test_sorted_by_name() {
        let rows = vec![
            row(1, 10, "sugar", "g", 50),
            row(2, 10, "flour", "g", 200),
            row(3, 10, "apple", "pcs", 3),
        ];

        let names: Vec<_> = aggregate(&rows).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["apple", "flour", "sugar"]);
    }

    #[test]
    fn test_aggregation_idempotence() {
        let rows = vec![
            row(1, 10, "salt", "g", 5),
            row(2, 11, "salt", "g", 3),
            row(3, 11, "flour", "g", 100),
        ];

        let at = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let recipes = vec![ReportRecipe {
            name: "Bread".to_string(),
            author: "Ivan Petrov".to_string(),
        }];

        let first = render_report("vasya", at, &aggregate(&rows), &recipes);
        let second = render_report("vasya", at, &aggregate(&rows), &recipes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_layout() {
        let rows = vec![row(1, 10, "salt", "g", 5), row(2, 11, "salt", "g", 3)];
        let at = Utc.with_ymd_and_hms(2026, 8, 25, 12, 30, 0).unwrap();
        let recipes = vec![
            ReportRecipe {
                name: "Soup".to_string(),
                author: "Ivan Petrov".to_string(),
            },
            ReportRecipe {
                name: "Stew".to_string(),
                author: "Anna Smith".to_string(),
            },
        ];

        let report = render_report("vasya", at, &aggregate(&rows), &recipes);
        let lines: Vec<_> = report.lines().collect();

        assert_eq!(lines[0], "Foodgram shopping list | 25.08.2026 12:30");
        assert_eq!(lines[1], "User: vasya");
        assert_eq!(lines[3], "Ingredients:");
        assert_eq!(lines[4], "1. Salt — 8 g");
        assert_eq!(lines[6], "Recipes:");
        assert_eq!(lines[7], "- Soup (author: Ivan Petrov)");
        assert_eq!(lines[8], "- Stew (author: Anna Smith)");
        assert_eq!(*lines.last().unwrap(), "(c) Foodgram 2026");
    }

    #[test]
    fn test_empty_cart_renders_explicit_line() {
        let at = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let report = render_report("vasya", at, &[], &[]);
        assert!(report.contains("No items in the shopping cart."));
        assert!(report.starts_with("Foodgram shopping list |"));
    }

    #[test]
    fn test_numbering_is_sequential() {
        let rows = vec![
            row(1, 10, "apple", "pcs", 1),
            row(2, 10, "flour", "g", 100),
            row(3, 10, "sugar", "g", 50),
        ];
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let report = render_report("vasya", at, &aggregate(&rows), &[]);

        assert!(report.contains("1. Apple — 1 pcs"));
        assert!(report.contains("2. Flour — 100 g"));
        assert!(report.contains("3. Sugar — 50 g"));
    }
}
