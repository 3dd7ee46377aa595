use crate::api::recipes::common::{load_recipe_response, RecipeResponse};
use crate::api::recipes::create::{insert_recipe_contents, write_error_response, RecipeIngredientInput, WriteError};
use crate::api::{validation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use crate::validation::{validate_recipe, IngredientAmount, RecipePayload};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Updates replace the full ingredient and tag sets; there is no partial
/// patching of either list. Omitting the image keeps the stored one.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Vec<RecipeIngredientInput>,
    /// Tag IDs
    pub tags: Vec<Uuid>,
    pub name: String,
    /// New image reference; absent keeps the current image
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (field-keyed messages)"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRecipeRequest>,
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
        image: req.image.as_deref(),
        cooking_time: req.cooking_time,
        ingredients: &entries,
        tags: &req.tags,
    }) {
        return validation_error_response(errors);
    }

    let mut conn = get_conn!(pool);

    let author_id: Uuid = match recipes::table
        .filter(recipes::id.eq(id))
        .select(recipes::author_id)
        .first(&mut conn)
    {
        Ok(a) => a,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if author_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the author can edit a recipe".to_string(),
            }),
        )
            .into_response();
    }

    let result: Result<Recipe, WriteError> = conn.transaction(|conn| {
        let recipe: Recipe = match req.image.as_deref() {
            Some(image) => diesel::update(recipes::table.find(id))
                .set((
                    recipes::name.eq(&req.name),
                    recipes::image.eq(image),
                    recipes::text.eq(&req.text),
                    recipes::cooking_time.eq(req.cooking_time),
                ))
                .returning(Recipe::as_returning())
                .get_result(conn)?,
            None => diesel::update(recipes::table.find(id))
                .set((
                    recipes::name.eq(&req.name),
                    recipes::text.eq(&req.text),
                    recipes::cooking_time.eq(req.cooking_time),
                ))
                .returning(Recipe::as_returning())
                .get_result(conn)?,
        };

        // Replace both junction sets wholesale
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id))).execute(conn)?;
        diesel::delete(
            recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)),
        )
        .execute(conn)?;

        insert_recipe_contents(conn, id, &req.tags, &entries)?;

        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => return write_error_response(e, "update"),
    };

    match load_recipe_response(&mut conn, Some(user.id), &recipe) {
        Ok(Some(response)) => (StatusCode::OK, Json(response)).into_response(),
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
