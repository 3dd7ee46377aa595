//! Field-level validation for write payloads.
//!
//! The recipe validator checks every field independently and reports all
//! failures at once, keyed by field name, so a client gets the complete
//! picture in a single round trip.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 32_000;

/// Usernames that collide with API routes.
const RESERVED_USERNAMES: &[&str] = &["me"];

/// Validation failures keyed by field name.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct ValidationErrors {
    #[serde(flatten)]
    pub fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// One ingredient reference in a recipe write payload.
#[derive(Debug, Clone, Copy)]
pub struct IngredientAmount {
    pub ingredient_id: Uuid,
    pub amount: i32,
}

/// The validator's view of a recipe write payload.
pub struct RecipePayload<'a> {
    pub name: &'a str,
    pub text: &'a str,
    /// None on update means "keep the stored image"; create always passes Some.
    pub image: Option<&'a str>,
    pub cooking_time: i32,
    pub ingredients: &'a [IngredientAmount],
    pub tags: &'a [Uuid],
}

pub fn validate_recipe(payload: &RecipePayload<'_>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if payload.name.trim().is_empty() {
        errors.add("name", "Name cannot be empty.");
    }

    if payload.text.trim().is_empty() {
        errors.add("text", "Text cannot be empty.");
    }

    if let Some(image) = payload.image {
        if image.is_empty() {
            errors.add("image", "Image cannot be empty.");
        }
    }

    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&payload.cooking_time) {
        errors.add(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes.",
                MIN_COOKING_TIME, MAX_COOKING_TIME
            ),
        );
    }

    if payload.ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
    } else {
        let mut seen = std::collections::HashSet::new();
        for entry in payload.ingredients {
            if !seen.insert(entry.ingredient_id) {
                errors.add("ingredients", "Ingredients must not repeat.");
                break;
            }
        }
        for entry in payload.ingredients {
            if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&entry.amount) {
                errors.add(
                    "ingredients",
                    format!(
                        "Amount must be between {} and {}.",
                        MIN_INGREDIENT_AMOUNT, MAX_INGREDIENT_AMOUNT
                    ),
                );
                break;
            }
        }
    }

    if payload.tags.is_empty() {
        errors.add("tags", "At least one tag is required.");
    } else {
        let unique: std::collections::HashSet<_> = payload.tags.iter().collect();
        if unique.len() != payload.tags.len() {
            errors.add("tags", "Tags must not repeat.");
        }
    }

    errors.into_result()
}

/// Tag colors are hex strings like `#49B64E`.
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Usernames allow word characters plus `.@+-` and must not shadow routes.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty.".to_string());
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'));
    if !valid {
        return Err("Username contains invalid characters.".to_string());
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(format!("Username \"{}\" is reserved.", username));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingr(id: u128, amount: i32) -> IngredientAmount {
        IngredientAmount {
            ingredient_id: Uuid::from_u128(id),
            amount,
        }
    }

    fn valid_payload<'a>(
        ingredients: &'a [IngredientAmount],
        tags: &'a [Uuid],
    ) -> RecipePayload<'a> {
        RecipePayload {
            name: "Pancakes",
            text: "Mix and fry.",
            image: Some("data:image/png;base64,AAAA"),
            cooking_time: 20,
            ingredients,
            tags,
        }
    }

    #[test]
    fn test_accepts_valid_payload() {
        let ingredients = [ingr(1, 200), ingr(2, 50)];
        let tags = [Uuid::from_u128(10)];
        assert!(validate_recipe(&valid_payload(&ingredients, &tags)).is_ok());
    }

    #[test]
    fn test_rejects_empty_ingredients() {
        let tags = [Uuid::from_u128(10)];
        let err = validate_recipe(&valid_payload(&[], &tags)).unwrap_err();
        assert!(err.fields.contains_key("ingredients"));
    }

    #[test]
    fn test_rejects_duplicate_ingredients_regardless_of_amounts() {
        let ingredients = [ingr(1, 200), ingr(1, 100)];
        let tags = [Uuid::from_u128(10)];
        let err = validate_recipe(&valid_payload(&ingredients, &tags)).unwrap_err();
        assert!(err.fields.contains_key("ingredients"));
    }

    #[test]
    fn test_rejects_out_of_bounds_amount() {
        let tags = [Uuid::from_u128(10)];

        let low = [ingr(1, MIN_INGREDIENT_AMOUNT - 1)];
        assert!(validate_recipe(&valid_payload(&low, &tags)).is_err());

        let high = [ingr(1, MAX_INGREDIENT_AMOUNT + 1)];
        assert!(validate_recipe(&valid_payload(&high, &tags)).is_err());

        let min = [ingr(1, MIN_INGREDIENT_AMOUNT)];
        assert!(validate_recipe(&valid_payload(&min, &tags)).is_ok());

        let max = [ingr(1, MAX_INGREDIENT_AMOUNT)];
        assert!(validate_recipe(&valid_payload(&max, &tags)).is_ok());
    }

    #[test]
    fn test_cooking_time_boundaries() {
        let ingredients = [ingr(1, 10)];
        let tags = [Uuid::from_u128(10)];

        for (time, ok) in [
            (MIN_COOKING_TIME, true),
            (MAX_COOKING_TIME, true),
            (MIN_COOKING_TIME - 1, false),
            (MAX_COOKING_TIME + 1, false),
        ] {
            let mut payload = valid_payload(&ingredients, &tags);
            payload.cooking_time = time;
            assert_eq!(validate_recipe(&payload).is_ok(), ok, "time={}", time);
        }
    }

    #[test]
    fn test_rejects_empty_and_duplicate_tags() {
        let ingredients = [ingr(1, 10)];

        let err = validate_recipe(&valid_payload(&ingredients, &[])).unwrap_err();
        assert!(err.fields.contains_key("tags"));

        let tags = [Uuid::from_u128(10), Uuid::from_u128(10)];
        let err = validate_recipe(&valid_payload(&ingredients, &tags)).unwrap_err();
        assert!(err.fields.contains_key("tags"));
    }

    #[test]
    fn test_reports_all_failing_fields_at_once() {
        let payload = RecipePayload {
            name: "",
            text: "",
            image: Some(""),
            cooking_time: 0,
            ingredients: &[],
            tags: &[],
        };
        let err = validate_recipe(&payload).unwrap_err();
        for field in ["name", "text", "image", "cooking_time", "ingredients", "tags"] {
            assert!(err.fields.contains_key(field), "missing field {}", field);
        }
    }

    #[test]
    fn test_missing_image_is_allowed_on_update() {
        let ingredients = [ingr(1, 10)];
        let tags = [Uuid::from_u128(10)];
        let mut payload = valid_payload(&ingredients, &tags);
        payload.image = None;
        assert!(validate_recipe(&payload).is_ok());
    }

    #[test]
    fn test_hex_color() {
        assert!(is_valid_hex_color("#49B64E"));
        assert!(is_valid_hex_color("#ffffff"));
        assert!(!is_valid_hex_color("49B64E"));
        assert!(!is_valid_hex_color("#49B64"));
        assert!(!is_valid_hex_color("#49B64EZ"));
        assert!(!is_valid_hex_color("#GGGGGG"));
        assert!(!is_valid_hex_color(""));
    }

    #[test]
    fn test_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b@c+d-e_f").is_ok());
        assert!(validate_username("me").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("no/slash").is_err());
    }
}
