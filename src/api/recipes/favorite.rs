use crate::api::recipes::RecipeShortResponse;
use crate::api::{relation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::relations;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe favorited", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 409, description = "Already favorited", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if let Err(e) = relations::add::<relations::Favorite>(&mut conn, user.id, id) {
        return relation_error_response(e);
    }

    respond_with_short_recipe(&mut conn, id)
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe or favorite not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match relations::remove::<relations::Favorite>(&mut conn, user.id, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => relation_error_response(e),
    }
}

/// 201 with the short recipe form, shared with the cart endpoint.
pub(crate) fn respond_with_short_recipe(
    conn: &mut PgConnection,
    id: Uuid,
) -> axum::response::Response {
    match recipes::table
        .filter(recipes::id.eq(id))
        .select(Recipe::as_select())
        .first::<Recipe>(conn)
    {
        Ok(recipe) => (
            StatusCode::CREATED,
            Json(RecipeShortResponse::from_recipe(&recipe)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
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
