//! Shopping list aggregation.
//!
//! The list is recomputed from the cart on every request. Cart contents can
//! change between requests, so a cached list would be wrong, not just stale.

use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{ingredients, recipe_ingredients, shopping_cart};

/// One merged line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Load every ingredient row reachable from the user's cart and merge them.
pub fn for_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Vec<ShoppingListEntry>> {
    let recipe_ids: Vec<Uuid> = shopping_cart::table
        .filter(shopping_cart::user_id.eq(user_id))
        .select(shopping_cart::recipe_id)
        .load(conn)?;

    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    Ok(merge(rows))
}

/// Group rows by (name, measurement unit) and sum the amounts.
///
/// Output is ordered by ingredient name, ascending byte order; entries with
/// the same name but different units keep their first-seen order (the sort
/// is stable). The result depends only on the multiset of rows, not on the
/// order recipes were added to the cart.
pub fn merge(rows: impl IntoIterator<Item = (String, String, i32)>) -> Vec<ShoppingListEntry> {
    let mut entries: Vec<ShoppingListEntry> = Vec::new();
    let mut index: std::collections::HashMap<(String, String), usize> =
        std::collections::HashMap::new();

    for (name, unit, amount) in rows {
        match index.get(&(name.clone(), unit.clone())) {
            Some(&i) => entries[i].total_amount += i64::from(amount),
            None => {
                index.insert((name.clone(), unit.clone()), entries.len());
                entries.push(ShoppingListEntry {
                    name,
                    measurement_unit: unit,
                    total_amount: i64::from(amount),
                });
            }
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Render the merged list as the downloadable plain-text file, one numbered
/// line per entry.
pub fn render_text(entries: &[ShoppingListEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} {} {}",
                i + 1,
                entry.name,
                entry.total_amount,
                entry.measurement_unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> (String, String, i32) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_merges_same_ingredient_across_recipes() {
        // Recipe1: Flour 200 g. Recipe2: Flour 100 g, Sugar 50 g.
        let merged = merge(vec![
            row("Flour", "g", 200),
            row("Flour", "g", 100),
            row("Sugar", "g", 50),
        ]);
        assert_eq!(
            merged,
            vec![
                ShoppingListEntry {
                    name: "Flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 300,
                },
                ShoppingListEntry {
                    name: "Sugar".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 50,
                },
            ]
        );
    }

    #[test]
    fn test_same_name_different_unit_stays_separate() {
        let merged = merge(vec![row("Milk", "ml", 200), row("Milk", "tbsp", 3)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].measurement_unit, "ml");
        assert_eq!(merged[1].measurement_unit, "tbsp");
    }

    #[test]
    fn test_insensitive_to_cart_insertion_order() {
        let a = merge(vec![
            row("Flour", "g", 200),
            row("Sugar", "g", 50),
            row("Flour", "g", 100),
        ]);
        let b = merge(vec![
            row("Sugar", "g", 50),
            row("Flour", "g", 100),
            row("Flour", "g", 200),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ordered_by_name_byte_order() {
        let merged = merge(vec![
            row("banana", "pcs", 1),
            row("Apple", "pcs", 1),
            row("Zucchini", "pcs", 1),
        ]);
        // Uppercase sorts before lowercase in byte order.
        let names: Vec<&str> = merged.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zucchini", "banana"]);
    }

    #[test]
    fn test_empty_cart_is_empty_list() {
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_amount_sum_does_not_overflow_i32() {
        let merged = merge(vec![
            row("Flour", "g", i32::MAX),
            row("Flour", "g", i32::MAX),
        ]);
        assert_eq!(merged[0].total_amount, i64::from(i32::MAX) * 2);
    }

    #[test]
    fn test_render_text_numbering_and_format() {
        let entries = merge(vec![row("Flour", "g", 300), row("Sugar", "g", 50)]);
        assert_eq!(render_text(&entries), "1. Flour 300 g\n2. Sugar 50 g");
        assert_eq!(render_text(&[]), "");
    }
}
