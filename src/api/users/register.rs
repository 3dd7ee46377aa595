use crate::api::users::UserResponse;
use crate::api::ErrorResponse;
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::validation::validate_username;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(message) = validate_username(&req.username) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response();
    }

    for (value, field) in [
        (&req.email, "Email"),
        (&req.first_name, "First name"),
        (&req.last_name, "Last name"),
        (&req.password, "Password"),
    ] {
        if value.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("{} cannot be empty", field),
                }),
            )
                .into_response();
        }
    }

    let mut conn = get_conn!(pool);

    let password_hash = match hash_password(&req.password) {
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

    let new_user = NewUser {
        username: &req.username,
        email: &req.email,
        first_name: &req.first_name,
        last_name: &req.last_name,
        password_hash: &password_hash,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Username or email already taken".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(UserResponse::from_user(&user, false)),
    )
        .into_response()
}
