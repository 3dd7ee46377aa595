use crate::api::tags::TagResponse;
use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Tag;
use crate::schema::tags;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "Tag catalog, ordered by slug", body = [TagResponse])
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match tags::table
        .order(tags::slug.asc())
        .select(Tag::as_select())
        .load(&mut conn)
    {
        Ok(rows) => {
            let tags: Vec<TagResponse> = rows.iter().map(TagResponse::from_tag).collect();
            (StatusCode::OK, Json(tags)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch tags: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch tags".to_string(),
                }),
            )
                .into_response()
        }
    }
}
