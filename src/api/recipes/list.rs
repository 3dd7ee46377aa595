use crate::api::recipes::common::{load_recipe_responses, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::OptionalAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::pagination::{PageParams, PaginationMetadata};
use crate::raw_sql::count_over;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart, tags};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Parsed recipe list filters.
///
/// `tags` may repeat in the query string (`?tags=breakfast&tags=lunch`, OR
/// semantics), which a plain params struct can't express, so the raw pairs
/// are parsed by hand.
#[derive(Debug, Default, PartialEq)]
struct ListRecipesParams {
    author: Option<Uuid>,
    tags: Vec<String>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
    page: Option<i64>,
    limit: Option<i64>,
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn parse_params(pairs: &[(String, String)]) -> ListRecipesParams {
    let mut params = ListRecipesParams::default();

    for (key, value) in pairs {
        match key.as_str() {
            "author" => params.author = value.parse().ok(),
            "tags" => {
                if !value.is_empty() {
                    params.tags.push(value.clone());
                }
            }
            "is_favorited" => params.is_favorited = parse_flag(value),
            "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(value),
            "page" => params.page = value.parse().ok(),
            "limit" => params.limit = value.parse().ok(),
            _ => {}
        }
    }

    params
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(
        ("author" = Option<Uuid>, Query, description = "Only recipes by this author"),
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs (repeatable, OR semantics)"),
        ("is_favorited" = Option<String>, Query, description = "1/true: only the caller's favorites"),
        ("is_in_shopping_cart" = Option<String>, Query, description = "1/true: only recipes in the caller's cart"),
        ("page" = Option<i64>, Query, description = "1-based page number (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Recipes, most recent first", body = ListRecipesResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let params = parse_params(&pairs);
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve();
    let viewer_id = viewer.map(|v| v.id);

    let mut conn = get_conn!(pool);

    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if !params.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(params.tags.clone()))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    // The favorite/cart flags are scoped to the caller and do nothing for
    // anonymous requests.
    if let Some(viewer_id) = viewer_id {
        if params.is_favorited {
            let favorited = favorites::table
                .filter(favorites::user_id.eq(viewer_id))
                .select(favorites::recipe_id);
            query = query.filter(recipes::id.eq_any(favorited));
        }
        if params.is_in_shopping_cart {
            let in_cart = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer_id))
                .select(shopping_cart::recipe_id);
            query = query.filter(recipes::id.eq_any(in_cart));
        }
    }

    // COUNT(*) OVER() gives the total match count before LIMIT/OFFSET
    let rows: Vec<(Recipe, i64)> = match query
        .order(recipes::created_at.desc())
        .select((Recipe::as_select(), count_over()))
        .limit(page.limit)
        .offset(page.offset)
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let page_recipes: Vec<Recipe> = rows.into_iter().map(|(recipe, _)| recipe).collect();

    let recipes = match load_recipe_responses(&mut conn, viewer_id, &page_recipes) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to serialize recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            recipes,
            pagination: PaginationMetadata::new(total, page),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_empty() {
        let params = parse_params(&[]);
        assert_eq!(params, ListRecipesParams::default());
    }

    #[test]
    fn test_parse_repeated_tags() {
        let params = parse_params(&pairs(&[("tags", "breakfast"), ("tags", "lunch")]));
        assert_eq!(params.tags, vec!["breakfast", "lunch"]);
    }

    #[test]
    fn test_parse_flags() {
        let params = parse_params(&pairs(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "true"),
        ]));
        assert!(params.is_favorited);
        assert!(params.is_in_shopping_cart);

        let params = parse_params(&pairs(&[("is_favorited", "0")]));
        assert!(!params.is_favorited);
    }

    #[test]
    fn test_parse_author_and_pagination() {
        let id = Uuid::from_u128(42);
        let params = parse_params(&pairs(&[
            ("author", &id.to_string()),
            ("page", "2"),
            ("limit", "5"),
        ]));
        assert_eq!(params.author, Some(id));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn test_parse_ignores_garbage() {
        let params = parse_params(&pairs(&[
            ("author", "not-a-uuid"),
            ("page", "x"),
            ("unknown", "1"),
            ("tags", ""),
        ]));
        assert_eq!(params, ListRecipesParams::default());
    }
}
