use crate::api::users::{followed_set, UserResponse};
use crate::api::ErrorResponse;
use crate::auth::OptionalAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
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
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = super::UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let user: User = match users::table
        .filter(users::id.eq(id))
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let followed = match followed_set(&mut conn, viewer.map(|v| v.id), &[user.id]) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(UserResponse::from_user(&user, followed.contains(&user.id))),
    )
        .into_response()
}
