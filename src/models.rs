use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub slug: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub measurement_unit: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub author_id: Uuid,
    pub name: &'a str,
    pub image: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_tags)]
pub struct NewRecipeTag {
    pub recipe_id: Uuid,
    pub tag_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
pub struct NewRecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::shopping_cart)]
pub struct NewCartEntry {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::follows)]
pub struct NewFollow {
    pub user_id: Uuid,
    pub following_id: Uuid,
}
