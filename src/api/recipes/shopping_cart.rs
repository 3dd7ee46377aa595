use crate::api::recipes::favorite::respond_with_short_recipe;
use crate::api::recipes::RecipeShortResponse;
use crate::api::{relation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::relations;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe added to cart", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 409, description = "Already in cart", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if let Err(e) = relations::add::<relations::Cart>(&mut conn, user.id, id) {
        return relation_error_response(e);
    }

    respond_with_short_recipe(&mut conn, id)
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from cart"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe or cart entry not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match relations::remove::<relations::Cart>(&mut conn, user.id, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => relation_error_response(e),
    }
}
