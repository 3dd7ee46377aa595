use crate::api::recipes::common::{load_recipe_response, RecipeResponse};
use crate::api::{validation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use crate::validation::{validate_recipe, IngredientAmount, RecipePayload, ValidationErrors};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeIngredientInput {
    /// Ingredient ID
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<RecipeIngredientInput>,
    /// Tag IDs
    pub tags: Vec<Uuid>,
    pub name: String,
    /// Image reference (non-empty)
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Failures while writing a recipe's tag/ingredient sets.
pub(crate) enum WriteError {
    UnknownTag,
    UnknownIngredient,
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for WriteError {
    fn from(error: diesel::result::Error) -> Self {
        WriteError::Db(error)
    }
}

/// Insert the recipe's tag and ingredient rows. Callers have already
/// validated the payload shape; this checks the referenced catalog rows
/// actually exist. Ingredient rows are inserted in name order so they read
/// back in a stable order.
pub(crate) fn insert_recipe_contents(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    entries: &[IngredientAmount],
) -> Result<(), WriteError> {
    let found_tags: i64 = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .count()
        .get_result(conn)?;
    if found_tags as usize != tag_ids.len() {
        return Err(WriteError::UnknownTag);
    }

    let tag_rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&tag_rows)
        .execute(conn)?;

    let ingredient_ids: Vec<Uuid> = entries.iter().map(|e| e.ingredient_id).collect();
    let names: Vec<(Uuid, String)> = ingredients::table
        .filter(ingredients::id.eq_any(&ingredient_ids))
        .select((ingredients::id, ingredients::name))
        .load(conn)?;
    if names.len() != entries.len() {
        return Err(WriteError::UnknownIngredient);
    }
    let name_by_id: HashMap<Uuid, String> = names.into_iter().collect();

    let mut rows: Vec<(&String, NewRecipeIngredient)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = name_by_id
            .get(&entry.ingredient_id)
            .ok_or(WriteError::UnknownIngredient)?;
        rows.push((
            name,
            NewRecipeIngredient {
                recipe_id,
                ingredient_id: entry.ingredient_id,
                amount: entry.amount,
            },
        ));
    }
    rows.sort_by(|a, b| a.0.cmp(b.0));
    let ingredient_rows: Vec<NewRecipeIngredient> =
        rows.into_iter().map(|(_, row)| row).collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&ingredient_rows)
        .execute(conn)?;

    Ok(())
}

/// Render a contents-write failure: unknown catalog references are
/// field-keyed validation errors, everything else is a 500.
pub(crate) fn write_error_response(error: WriteError, action: &str) -> axum::response::Response {
    match error {
        WriteError::UnknownTag => {
            let mut errors = ValidationErrors::default();
            errors.add("tags", "Unknown tag.");
            validation_error_response(errors)
        }
        WriteError::UnknownIngredient => {
            let mut errors = ValidationErrors::default();
            errors.add("ingredients", "Unknown ingredient.");
            validation_error_response(errors)
        }
        WriteError::Db(e) => {
            tracing::error!("Failed to {} recipe: {}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to {} recipe", action),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (field-keyed messages)"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let entries: Vec<IngredientAmount> = req
        .ingredients
        .iter()
        .map(|i| IngredientAmount {
            ingredient_id: i.id,
            amount: i.amount,
        })
        .collect();

    if let Err(errors) = validate_recipe(&RecipePayload {
        name: &req.name,
        text: &req.text,
        image: Some(&req.image),
        cooking_time: req.cooking_time,
        ingredients: &entries,
        tags: &req.tags,
    }) {
        return validation_error_response(errors);
    }

    let mut conn = get_conn!(pool);

    // Recipe row plus both junction sets land atomically
    let result: Result<Recipe, WriteError> = conn.transaction(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(NewRecipe {
                author_id: user.id,
                name: &req.name,
                image: &req.image,
                text: &req.text,
                cooking_time: req.cooking_time,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        insert_recipe_contents(conn, recipe.id, &req.tags, &entries)?;

        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => return write_error_response(e, "create"),
    };

    match load_recipe_response(&mut conn, Some(user.id), &recipe) {
        Ok(Some(response)) => (StatusCode::CREATED, Json(response)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
