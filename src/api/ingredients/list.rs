use crate::api::ingredients::IngredientResponse;
use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix filter
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Ingredient catalog, ordered by name", body = [IngredientResponse])
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let mut query = ingredients::table.into_boxed();
    if let Some(ref name) = params.name {
        if !name.is_empty() {
            let pattern = format!("{}%", name.replace('%', "\\%").replace('_', "\\_"));
            query = query.filter(ingredients::name.ilike(pattern));
        }
    }

    match query
        .order(ingredients::name.asc())
        .select(Ingredient::as_select())
        .load(&mut conn)
    {
        Ok(rows) => {
            let ingredients: Vec<IngredientResponse> = rows
                .iter()
                .map(IngredientResponse::from_ingredient)
                .collect();
            (StatusCode::OK, Json(ingredients)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch ingredients: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredients".to_string(),
                }),
            )
                .into_response()
        }
    }
}
