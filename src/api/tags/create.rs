use crate::api::tags::TagResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewTag, Tag};
use crate::schema::tags;
use crate::validation::is_valid_hex_color;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    /// Hex color like `#49B64E`
    pub color: String,
    pub slug: String,
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Slug already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_tag(
    AuthUser(_user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateTagRequest>,
) -> impl IntoResponse {
    let name = req.name.trim();
    let slug = req.slug.trim();

    if name.is_empty() || slug.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Name and slug cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    if !is_valid_hex_color(&req.color) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Color must be a hex string like #49B64E".to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(pool);

    let result: Result<Tag, _> = diesel::insert_into(tags::table)
        .values(NewTag {
            name,
            color: &req.color,
            slug,
        })
        .returning(Tag::as_returning())
        .get_result(&mut conn);

    match result {
        Ok(tag) => (StatusCode::CREATED, Json(TagResponse::from_tag(&tag))).into_response(),
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Tag slug already exists".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create tag: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create tag".to_string(),
                }),
            )
                .into_response()
        }
    }
}
