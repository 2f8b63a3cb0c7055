//! Business-domain row operations: wishes, baskets, orders, deposit points

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Wish {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Basket {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub deposit_point_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct DepositPoint {
    pub id: String,
    pub name: String,
    pub address: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) async fn insert_wish<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
    title: &str,
    url: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO wish (id, user_id, title, url, created_at)
        VALUES ($1, $2, $3, $4, $5)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(url)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn list_wishes_by_user<'e, E>(
    db: E,
    user_id: &str,
) -> Result<Vec<Wish>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM wish WHERE user_id = $1 ORDER BY created_at")
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub(crate) async fn insert_basket<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
    status: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO basket (id, user_id, status, created_at)
        VALUES ($1, $2, $3, $4)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn list_baskets_by_user<'e, E>(
    db: E,
    user_id: &str,
) -> Result<Vec<Basket>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM basket WHERE user_id = $1 ORDER BY created_at")
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub(crate) async fn insert_order<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
    deposit_point_id: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO \"order\" (id, user_id, deposit_point_id, status, created_at)
        VALUES ($1, $2, $3, 'pending', $4)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .bind(deposit_point_id)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn list_orders_by_user<'e, E>(
    db: E,
    user_id: &str,
) -> Result<Vec<Order>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM \"order\" WHERE user_id = $1 ORDER BY created_at")
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub(crate) async fn insert_deposit_point<'e, E>(
    db: E,
    id: &str,
    name: &str,
    address: &str,
    created_by: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = "
        INSERT INTO deposit_point (id, name, address, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5)
    ";
    sqlx::query(query)
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(created_by)
        .bind(Utc::now())
        .execute(db)
        .await?;
    Ok(())
}

pub(crate) async fn list_deposit_points<'e, E>(db: E) -> Result<Vec<DepositPoint>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM deposit_point ORDER BY created_at")
        .fetch_all(db)
        .await
}
