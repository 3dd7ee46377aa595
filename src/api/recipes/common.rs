//! Full read serialization of recipes, built with batched queries so list
//! pages don't fan out into per-recipe lookups.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::tags::TagResponse;
use crate::api::users::{followed_set, UserResponse};
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{favorites, ingredients, recipe_ingredients, recipe_tags, shopping_cart, tags, users};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    /// Whether the requesting user favorited this recipe (false for anonymous)
    pub is_favorited: bool,
    /// Whether this recipe is in the requesting user's cart (false for anonymous)
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Serialize a batch of recipes, preserving their order.
pub fn load_recipe_responses(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    recipes: &[Recipe],
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();

    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }
    for tag_list in tags_by_recipe.values_mut() {
        tag_list.sort_by(|a, b| a.slug.cmp(&b.slug));
    }

    let ingredient_rows: Vec<(Uuid, i32, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::amount,
            Ingredient::as_select(),
        ))
        .load(conn)?;
    let mut ingredients_by_recipe: HashMap<Uuid, Vec<(i32, Ingredient)>> = HashMap::new();
    for (recipe_id, amount, ingredient) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push((amount, ingredient));
    }
    for entries in ingredients_by_recipe.values_mut() {
        entries.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    }

    let authors: Vec<User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?;
    let authors_by_id: HashMap<Uuid, User> =
        authors.into_iter().map(|u| (u.id, u)).collect();
    let followed = followed_set(conn, viewer, &author_ids)?;

    let (favorited, in_cart) = match viewer {
        Some(viewer) => {
            let favorited: Vec<Uuid> = favorites::table
                .filter(favorites::user_id.eq(viewer))
                .filter(favorites::recipe_id.eq_any(&recipe_ids))
                .select(favorites::recipe_id)
                .load(conn)?;
            let in_cart: Vec<Uuid> = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer))
                .filter(shopping_cart::recipe_id.eq_any(&recipe_ids))
                .select(shopping_cart::recipe_id)
                .load(conn)?;
            (
                favorited.into_iter().collect::<HashSet<_>>(),
                in_cart.into_iter().collect::<HashSet<_>>(),
            )
        }
        None => (HashSet::new(), HashSet::new()),
    };

    let responses = recipes
        .iter()
        .filter_map(|recipe| {
            // The author can disappear between queries; its recipes cascade
            // away with it, so skip rather than serve a half-built row.
            let author = authors_by_id.get(&recipe.author_id)?;
            Some(RecipeResponse {
                id: recipe.id,
                tags: tags_by_recipe
                    .remove(&recipe.id)
                    .unwrap_or_default()
                    .iter()
                    .map(TagResponse::from_tag)
                    .collect(),
                author: UserResponse::from_user(author, followed.contains(&author.id)),
                ingredients: ingredients_by_recipe
                    .remove(&recipe.id)
                    .unwrap_or_default()
                    .iter()
                    .map(|(amount, ingredient)| RecipeIngredientResponse {
                        id: ingredient.id,
                        name: ingredient.name.clone(),
                        measurement_unit: ingredient.measurement_unit.clone(),
                        amount: *amount,
                    })
                    .collect(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name.clone(),
                image: recipe.image.clone(),
                text: recipe.text.clone(),
                cooking_time: recipe.cooking_time,
            })
        })
        .collect();

    Ok(responses)
}

/// Serialize a single recipe. `None` when the author row vanished.
pub fn load_recipe_response(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    recipe: &Recipe,
) -> QueryResult<Option<RecipeResponse>> {
    let mut responses = load_recipe_responses(conn, viewer, std::slice::from_ref(recipe))?;
    if responses.is_empty() {
        Ok(None)
    } else {
        Ok(Some(responses.remove(0)))
    }
}
