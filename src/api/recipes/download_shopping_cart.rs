use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::shopping_list;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list as a text attachment", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    // Always computed fresh; the cart may have changed since the last call
    let entries = match shopping_list::for_user(&mut conn, user.id) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Failed to aggregate shopping list: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let content = shopping_list::render_text(&entries);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=shopping-list.txt",
            ),
        ],
        content,
    )
        .into_response()
}
