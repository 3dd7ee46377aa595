use crate::api::users::UserResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The caller's profile", body = super::UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    // You never follow yourself, so is_subscribed is always false here.
    (StatusCode::OK, Json(UserResponse::from_user(&user, false))).into_response()
}
