pub mod get;
pub mod list;
pub mod me;
pub mod register;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use std::collections::HashSet;

use crate::models::User;
use crate::schema::follows;
use crate::AppState;
use axum::routing::{get as get_method, post};
use axum::Router;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/users endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get_method(list::list_users).post(register::register))
        .route("/me", get_method(me::me))
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get_method(subscriptions::subscriptions))
        .route("/{id}", get_method(get::get_user))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

/// User profile as every endpoint serializes it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requesting user follows this user (false for anonymous)
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// Which of `user_ids` the viewer follows. Empty for anonymous viewers.
pub fn followed_set(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    user_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let followed: Vec<Uuid> = follows::table
        .filter(follows::user_id.eq(viewer))
        .filter(follows::following_id.eq_any(user_ids))
        .select(follows::following_id)
        .load(conn)?;
    Ok(followed.into_iter().collect())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        register::register,
        list::list_users,
        get::get_user,
        me::me,
        set_password::set_password,
        subscriptions::subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        UserResponse,
        register::RegisterRequest,
        list::ListUsersResponse,
        set_password::SetPasswordRequest,
        subscriptions::SubscriptionResponse,
        subscriptions::SubscriptionsResponse,
    ))
)]
pub struct ApiDoc;
