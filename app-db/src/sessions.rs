//! Session row operations

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

/// A session record issued by the identity collaborator.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub(crate) async fn insert<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO session (id, user_id, token, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn get_by_token<'e, E>(db: E, token: &str) -> Result<Option<Session>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM session WHERE token = $1")
        .bind(token)
        .fetch_optional(db)
        .await
}

pub(crate) async fn delete_by_token<'e, E>(db: E, token: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM session WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
