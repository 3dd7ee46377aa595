use crate::api::users::subscriptions::{build_subscription, parse_recipes_limit};
use crate::api::{relation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::relations;
use crate::schema::users;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SubscribeParams {
    /// Cap on the number of recipes embedded in the response; absent or
    /// non-numeric falls back to the default page size
    pub recipes_limit: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User to follow"),
        SubscribeParams
    ),
    responses(
        (status = 201, description = "Subscribed", body = super::subscriptions::SubscriptionResponse),
        (status = 400, description = "Cannot follow yourself", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Already subscribed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Query(params): Query<SubscribeParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if let Err(e) = relations::add::<relations::Follow>(&mut conn, user.id, id) {
        return relation_error_response(e);
    }

    let author: User = match users::table
        .filter(users::id.eq(id))
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!("Failed to fetch followed user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref());
    match build_subscription(&mut conn, &author, recipes_limit) {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(e) => {
            tracing::error!("Failed to build subscription: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscription".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User to unfollow")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User or subscription not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match relations::remove::<relations::Follow>(&mut conn, user.id, id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => relation_error_response(e),
    }
}
