pub mod common;
pub mod create;
pub mod delete;
pub mod download_shopping_cart;
pub mod favorite;
pub mod get;
pub mod list;
pub mod shopping_cart;
pub mod update;

use crate::models::Recipe;
use crate::AppState;
use axum::routing::{get as get_method, post};
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/recipes endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get_method(list::list_recipes).post(create::create_recipe))
        .route(
            "/download_shopping_cart",
            get_method(download_shopping_cart::download_shopping_cart),
        )
        .route(
            "/{id}",
            get_method(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/favorite",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route(
            "/{id}/shopping_cart",
            post(shopping_cart::add_to_cart).delete(shopping_cart::remove_from_cart),
        )
}

/// Short recipe form embedded in favorite/cart/subscription responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeShortResponse {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        get::get_recipe,
        create::create_recipe,
        update::update_recipe,
        delete::delete_recipe,
        favorite::add_favorite,
        favorite::remove_favorite,
        shopping_cart::add_to_cart,
        shopping_cart::remove_from_cart,
        download_shopping_cart::download_shopping_cart,
    ),
    components(schemas(
        RecipeShortResponse,
        common::RecipeResponse,
        common::RecipeIngredientResponse,
        create::CreateRecipeRequest,
        create::RecipeIngredientInput,
        update::UpdateRecipeRequest,
        list::ListRecipesResponse,
    ))
)]
pub struct ApiDoc;
