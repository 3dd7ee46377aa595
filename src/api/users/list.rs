use crate::api::users::{followed_set, UserResponse};
use crate::api::ErrorResponse;
use crate::auth::OptionalAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::pagination::{PageParams, PaginationMetadata};
use crate::raw_sql::count_over;
use crate::schema::users;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Username substring filter
    pub search: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(ListUsersParams),
    responses(
        (status = 200, description = "List of users", body = ListUsersResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_users(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListUsersParams>,
) -> impl IntoResponse {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve();
    let pattern = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")));

    let mut conn = get_conn!(pool);

    let mut query = users::table.into_boxed();
    if let Some(ref pattern) = pattern {
        query = query.filter(users::username.ilike(pattern));
    }

    // COUNT(*) OVER() gives the total match count before LIMIT/OFFSET
    let rows: Vec<(User, i64)> = match query
        .order(users::username.asc())
        .select((User::as_select(), count_over()))
        .limit(page.limit)
        .offset(page.offset)
        .load(&mut conn)
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let page_users: Vec<User> = rows.into_iter().map(|(user, _)| user).collect();

    let ids: Vec<_> = page_users.iter().map(|u| u.id).collect();
    let followed = match followed_set(&mut conn, viewer.map(|v| v.id), &ids) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let users = page_users
        .iter()
        .map(|u| UserResponse::from_user(u, followed.contains(&u.id)))
        .collect();

    (
        StatusCode::OK,
        Json(ListUsersResponse {
            users,
            pagination: PaginationMetadata::new(total, page),
        }),
    )
        .into_response()
}
