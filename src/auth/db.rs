use crate::db::DbPool;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;

use super::crypto::hash_token;

const SESSION_LIFETIME_DAYS: i64 = 30;

/// Create a session row and return the raw bearer token. Only the SHA-256
/// digest of the token is stored.
pub fn create_session(
    conn: &mut PgConnection,
    user_id: uuid::Uuid,
) -> Result<String, diesel::result::Error> {
    let token = super::crypto::generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

/// Delete the session matching this raw token. Returns the number of rows
/// removed (zero when the token was never issued or already revoked).
pub fn revoke_session(
    conn: &mut PgConnection,
    token: &str,
) -> Result<usize, diesel::result::Error> {
    let token_hash = hash_token(token);
    diesel::delete(sessions::table.filter(sessions::token_hash.eq(&token_hash))).execute(conn)
}

pub async fn get_user_from_token(pool: &DbPool, token: &str) -> Option<User> {
    let mut conn = pool.get().ok()?;
    let token_hash = hash_token(token);

    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(User::as_select())
        .first(&mut conn)
        .ok()
}
