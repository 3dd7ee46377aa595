use crate::api::ErrorResponse;
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_password(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SetPasswordRequest>,
) -> impl IntoResponse {
    if !verify_password(&req.current_password, &user.password_hash) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Incorrect password".to_string(),
            }),
        )
            .into_response();
    }

    if req.new_password.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Password cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    let password_hash = match hash_password(&req.new_password) {
        Ok(h) => h,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to hash password".to_string(),
                }),
            )
                .into_response()
        }
    };

    let mut conn = get_conn!(pool);

    match diesel::update(users::table.find(user.id))
        .set(users::password_hash.eq(&password_hash))
        .execute(&mut conn)
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to update password: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update password".to_string(),
                }),
            )
                .into_response()
        }
    }
}
