use crate::api::ingredients::IngredientResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{Ingredient, NewIngredient};
use crate::schema::ingredients;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Ingredient already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_ingredient(
    AuthUser(_user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateIngredientRequest>,
) -> impl IntoResponse {
    let name = req.name.trim();
    let measurement_unit = req.measurement_unit.trim();

    if name.is_empty() || measurement_unit.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Name and measurement unit cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(pool);

    let result: Result<Ingredient, _> = diesel::insert_into(ingredients::table)
        .values(NewIngredient {
            name,
            measurement_unit,
        })
        .returning(Ingredient::as_returning())
        .get_result(&mut conn);

    match result {
        Ok(ingredient) => (
            StatusCode::CREATED,
            Json(IngredientResponse::from_ingredient(&ingredient)),
        )
            .into_response(),
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Ingredient already exists".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create ingredient: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}
