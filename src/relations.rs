//! User-to-object relation rows: favorites, shopping cart entries, follows.
//!
//! Each relation kind is a unit type implementing [`RelationKind`], so the
//! add/remove flow is shared while the queries stay fully typed. Uniqueness
//! lives in the database; a concurrent duplicate insert surfaces as a unique
//! violation and is re-mapped to [`RelationError::AlreadyExists`] here, so
//! the check-then-insert race never escapes as an opaque storage error.

use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewCartEntry, NewFavorite, NewFollow};
use crate::schema::{favorites, follows, recipes, shopping_cart, users};

#[derive(Error, Debug)]
pub enum RelationError {
    /// The recipe or user the relation points at does not exist.
    #[error("{0} not found")]
    TargetNotFound(&'static str),

    /// The relation row already exists for this (subject, target) pair.
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// No relation row to remove.
    #[error("{0} does not exist")]
    NotFound(&'static str),

    /// Semantically disallowed pair (following yourself).
    #[error("cannot follow yourself")]
    SelfReference,

    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),
}

pub trait RelationKind {
    /// Noun used in error messages, e.g. "favorite".
    const NAME: &'static str;
    /// What the relation points at, e.g. "recipe".
    const TARGET: &'static str;

    fn target_exists(conn: &mut PgConnection, target: Uuid) -> QueryResult<bool>;
    fn exists(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<bool>;
    fn insert(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize>;
    fn delete(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize>;

    /// Per-kind semantic guard, checked before inserting.
    fn check(_subject: Uuid, _target: Uuid) -> Result<(), RelationError> {
        Ok(())
    }
}

pub struct Favorite;

impl RelationKind for Favorite {
    const NAME: &'static str = "favorite";
    const TARGET: &'static str = "recipe";

    fn target_exists(conn: &mut PgConnection, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            recipes::table.filter(recipes::id.eq(target)),
        ))
        .get_result(conn)
    }

    fn exists(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            favorites::table
                .filter(favorites::user_id.eq(subject))
                .filter(favorites::recipe_id.eq(target)),
        ))
        .get_result(conn)
    }

    fn insert(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::insert_into(favorites::table)
            .values(NewFavorite {
                user_id: subject,
                recipe_id: target,
            })
            .execute(conn)
    }

    fn delete(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(subject))
                .filter(favorites::recipe_id.eq(target)),
        )
        .execute(conn)
    }
}

pub struct Cart;

impl RelationKind for Cart {
    const NAME: &'static str = "shopping cart entry";
    const TARGET: &'static str = "recipe";

    fn target_exists(conn: &mut PgConnection, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            recipes::table.filter(recipes::id.eq(target)),
        ))
        .get_result(conn)
    }

    fn exists(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            shopping_cart::table
                .filter(shopping_cart::user_id.eq(subject))
                .filter(shopping_cart::recipe_id.eq(target)),
        ))
        .get_result(conn)
    }

    fn insert(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::insert_into(shopping_cart::table)
            .values(NewCartEntry {
                user_id: subject,
                recipe_id: target,
            })
            .execute(conn)
    }

    fn delete(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::delete(
            shopping_cart::table
                .filter(shopping_cart::user_id.eq(subject))
                .filter(shopping_cart::recipe_id.eq(target)),
        )
        .execute(conn)
    }
}

pub struct Follow;

impl RelationKind for Follow {
    const NAME: &'static str = "subscription";
    const TARGET: &'static str = "user";

    fn target_exists(conn: &mut PgConnection, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::id.eq(target)),
        ))
        .get_result(conn)
    }

    fn exists(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            follows::table
                .filter(follows::user_id.eq(subject))
                .filter(follows::following_id.eq(target)),
        ))
        .get_result(conn)
    }

    fn insert(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::insert_into(follows::table)
            .values(NewFollow {
                user_id: subject,
                following_id: target,
            })
            .execute(conn)
    }

    fn delete(conn: &mut PgConnection, subject: Uuid, target: Uuid) -> QueryResult<usize> {
        diesel::delete(
            follows::table
                .filter(follows::user_id.eq(subject))
                .filter(follows::following_id.eq(target)),
        )
        .execute(conn)
    }

    fn check(subject: Uuid, target: Uuid) -> Result<(), RelationError> {
        if subject == target {
            return Err(RelationError::SelfReference);
        }
        Ok(())
    }
}

/// Create the relation row for (subject, target).
pub fn add<K: RelationKind>(
    conn: &mut PgConnection,
    subject: Uuid,
    target: Uuid,
) -> Result<(), RelationError> {
    if !K::target_exists(conn, target)? {
        return Err(RelationError::TargetNotFound(K::TARGET));
    }
    K::check(subject, target)?;
    if K::exists(conn, subject, target)? {
        return Err(RelationError::AlreadyExists(K::NAME));
    }
    K::insert(conn, subject, target)
        .map_err(|e| map_insert_error::<K>(e))?;
    Ok(())
}

/// Remove the relation row for (subject, target). Repeated removes keep
/// failing: a zero-row delete is an error, never a silent success.
pub fn remove<K: RelationKind>(
    conn: &mut PgConnection,
    subject: Uuid,
    target: Uuid,
) -> Result<(), RelationError> {
    if !K::target_exists(conn, target)? {
        return Err(RelationError::TargetNotFound(K::TARGET));
    }
    let deleted = K::delete(conn, subject, target)?;
    if deleted == 0 {
        return Err(RelationError::NotFound(K::NAME));
    }
    Ok(())
}

/// Two requests can both pass the existence check and race to insert; the
/// database constraint rejects the loser, which must read as a conflict.
fn map_insert_error<K: RelationKind>(error: diesel::result::Error) -> RelationError {
    match error {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            RelationError::AlreadyExists(K::NAME)
        }
        other => RelationError::Db(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_rejects_self_reference() {
        let id = Uuid::from_u128(7);
        assert!(matches!(
            Follow::check(id, id),
            Err(RelationError::SelfReference)
        ));
        assert!(Follow::check(id, Uuid::from_u128(8)).is_ok());
    }

    #[test]
    fn test_favorite_and_cart_have_no_self_reference_guard() {
        let id = Uuid::from_u128(7);
        assert!(Favorite::check(id, id).is_ok());
        assert!(Cart::check(id, id).is_ok());
    }

    #[test]
    fn test_unique_violation_maps_to_already_exists() {
        let violation = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_string()),
        );
        assert!(matches!(
            map_insert_error::<Favorite>(violation),
            RelationError::AlreadyExists("favorite")
        ));
    }

    #[test]
    fn test_other_database_errors_pass_through() {
        let other = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("fk".to_string()),
        );
        assert!(matches!(
            map_insert_error::<Follow>(other),
            RelationError::Db(_)
        ));
    }
}
