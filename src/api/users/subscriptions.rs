use crate::api::recipes::RecipeShortResponse;
use crate::api::users::UserResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{Recipe, User};
use crate::pagination::{PageParams, PaginationMetadata, DEFAULT_PAGE_SIZE};
use crate::schema::{follows, recipes, users};
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
pub struct SubscriptionsParams {
    /// Cap on the number of recipes embedded per author; absent or
    /// non-numeric falls back to the default page size
    pub recipes_limit: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
}

/// A followed author with a slice of their recipes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    /// Full recipe count, independent of the embedded slice
    pub recipes_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
    pub pagination: PaginationMetadata,
}

/// `recipes_limit` truncates the embedded recipe list when it parses as a
/// non-negative integer; anything else means "no explicit limit" and falls
/// back to the default page size rather than erroring.
pub(crate) fn parse_recipes_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n >= 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Build one subscription entry: the author plus a capped recipe slice and
/// the uncapped recipe count.
pub(crate) fn build_subscription(
    conn: &mut PgConnection,
    author: &User,
    recipes_limit: i64,
) -> QueryResult<SubscriptionResponse> {
    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .count()
        .get_result(conn)?;

    let author_recipes: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .order(recipes::created_at.desc())
        .limit(recipes_limit)
        .select(Recipe::as_select())
        .load(conn)?;

    Ok(SubscriptionResponse {
        author: UserResponse::from_user(author, true),
        recipes: author_recipes
            .iter()
            .map(RecipeShortResponse::from_recipe)
            .collect(),
        recipes_count,
    })
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Authors the caller follows", body = SubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> impl IntoResponse {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve();
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref());

    let mut conn = get_conn!(pool);

    let result: QueryResult<(i64, Vec<SubscriptionResponse>)> = (|| {
        let followed_ids: Vec<uuid::Uuid> = follows::table
            .filter(follows::user_id.eq(user.id))
            .select(follows::following_id)
            .load(&mut conn)?;

        let total = followed_ids.len() as i64;

        let authors: Vec<User> = users::table
            .filter(users::id.eq_any(&followed_ids))
            .order(users::username.asc())
            .limit(page.limit)
            .offset(page.offset)
            .select(User::as_select())
            .load(&mut conn)?;

        let mut subscriptions = Vec::with_capacity(authors.len());
        for author in &authors {
            subscriptions.push(build_subscription(&mut conn, author, recipes_limit)?);
        }

        Ok((total, subscriptions))
    })();

    match result {
        Ok((total, subscriptions)) => (
            StatusCode::OK,
            Json(SubscriptionsResponse {
                subscriptions,
                pagination: PaginationMetadata::new(total, page),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_limit_is_used() {
        assert_eq!(parse_recipes_limit(Some("2")), 2);
        assert_eq!(parse_recipes_limit(Some("0")), 0);
    }

    #[test]
    fn test_absent_limit_falls_back_to_page_size() {
        assert_eq!(parse_recipes_limit(None), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_invalid_limit_falls_back_to_page_size() {
        assert_eq!(parse_recipes_limit(Some("")), DEFAULT_PAGE_SIZE);
        assert_eq!(parse_recipes_limit(Some("abc")), DEFAULT_PAGE_SIZE);
        assert_eq!(parse_recipes_limit(Some("-1")), DEFAULT_PAGE_SIZE);
        assert_eq!(parse_recipes_limit(Some("2.5")), DEFAULT_PAGE_SIZE);
    }
}
