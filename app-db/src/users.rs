//! User and account row operations

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

/// A principal record in the `user` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The role value that grants administrator capability.
pub const ADMIN_ROLE: &str = "admin";

/// The role assigned to every freshly registered principal.
pub const DEFAULT_ROLE: &str = "user";

pub(crate) async fn insert<'e, E>(
    db: E,
    id: &str,
    name: &str,
    email: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let query = "
        INSERT INTO user (id, name, email, email_verified, role, created_at, updated_at)
        VALUES ($1, $2, $3, 0, $4, $5, $6)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(DEFAULT_ROLE)
        .bind(now)
        .bind(now)
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn get_by_email<'e, E>(db: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM user WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub(crate) async fn get_by_id<'e, E>(db: E, id: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM user WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub(crate) async fn count_by_role<'e, E>(db: E, role: &str) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE role = $1")
        .bind(role)
        .fetch_one(db)
        .await
}

/// Sets the role of the user with the given email.
///
/// Returns the number of rows updated. Zero means the target principal does
/// not exist, which callers treat as a consistency fault.
pub(crate) async fn set_role_by_email<'e, E>(
    db: E,
    email: &str,
    role: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "UPDATE user SET role = $1, updated_at = $2 WHERE email = $3";
    let result = sqlx::query(query)
        .bind(role)
        .bind(Utc::now())
        .bind(email)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn insert_account<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
    provider_id: &str,
    password_hash: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO account (id, user_id, provider_id, password_hash, created_at)
        VALUES ($1, $2, $3, $4, $5)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(provider_id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

/// Returns the stored credential hash for the given email, if the principal
/// has a password-based account.
pub(crate) async fn get_password_hash<'e, E>(
    db: E,
    email: &str,
) -> Result<Option<(String, String)>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        SELECT u.id, a.password_hash
          FROM account a
          JOIN user u ON a.user_id = u.id
         WHERE u.email = $1 AND a.provider_id = 'credential'
    ";
    let row: Option<(String, Option<String>)> = sqlx::query_as(query)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(row.and_then(|(user_id, hash)| hash.map(|h| (user_id, h))))
}
