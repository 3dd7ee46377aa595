pub mod create;
pub mod get;
pub mod list;

use crate::models::Ingredient;
use crate::AppState;
use axum::routing::get as get_method;
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/ingredients endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get_method(list::list_ingredients).post(create::create_ingredient),
        )
        .route("/{id}", get_method(get::get_ingredient))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

impl IngredientResponse {
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_ingredients, get::get_ingredient, create::create_ingredient),
    components(schemas(IngredientResponse, create::CreateIngredientRequest))
)]
pub struct ApiDoc;
