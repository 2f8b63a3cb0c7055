//! In-tree integration tests against a provisioned store

use chrono::{Duration, Utc};

use crate::{AppDb, Error, WIPE_ORDER};

async fn provisioned() -> AppDb {
    AppDb::provision().await.expect("failed to provision app db")
}

#[tokio::test]
async fn provision_creates_empty_schema() {
    //* Given
    let db = provisioned().await;

    //* Then
    for table in WIPE_ORDER {
        let count = db
            .table_row_count(table)
            .await
            .unwrap_or_else(|_| panic!("table {table} should exist"));
        assert_eq!(count, 0, "table {table} should be empty after provision");
    }
}

#[tokio::test]
async fn create_principal_rejects_duplicate_email() {
    //* Given
    let db = provisioned().await;
    let user = db
        .create_principal("Ada", "ada@example.test", "hash")
        .await
        .expect("failed to create principal");
    assert_eq!(user.role, "user");

    //* When
    let result = db.create_principal("Ada Again", "ada@example.test", "hash").await;

    //* Then
    assert!(matches!(result, Err(Error::EmailTaken { .. })));
    assert_eq!(db.table_row_count("user").await.unwrap(), 1);
    assert_eq!(db.table_row_count("account").await.unwrap(), 1);
}

#[tokio::test]
async fn set_user_role_surfaces_missing_principal() {
    //* Given
    let db = provisioned().await;

    //* When
    let result = db.set_user_role("ghost@example.test", "admin").await;

    //* Then
    assert!(matches!(result, Err(Error::RoleTargetMissing { .. })));
}

#[tokio::test]
async fn wipe_order_deletes_fully_populated_store() {
    //* Given
    // One row in every table, wired up across the whole reference graph.
    let db = provisioned().await;
    let user = db
        .create_principal("Ada", "ada@example.test", "hash")
        .await
        .expect("failed to create principal");

    db.insert_session(
        "session-1",
        &user.id,
        "token-1",
        Utc::now() + Duration::days(7),
    )
    .await
    .expect("failed to insert session");

    db.create_wish(&user.id, "a bicycle", None)
        .await
        .expect("failed to create wish");
    db.create_basket(&user.id, "open")
        .await
        .expect("failed to create basket");
    let dp = db
        .create_deposit_point("Station North", "1 North St", &user.id)
        .await
        .expect("failed to create deposit point");
    db.create_order(&user.id, &dp)
        .await
        .expect("failed to create order");

    sqlx::query(
        "INSERT INTO verification (id, identifier, value, expires_at, created_at)
         VALUES ('v1', 'ada@example.test', 'code', $1, $1)",
    )
    .bind(Utc::now())
    .execute(&*db.pool)
    .await
    .expect("failed to insert verification row");

    //* When
    for table in WIPE_ORDER {
        db.delete_all_rows(table)
            .await
            .unwrap_or_else(|e| panic!("deleting {table} should succeed: {e}"));
    }

    //* Then
    for table in WIPE_ORDER {
        assert_eq!(db.table_row_count(table).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn deleting_referenced_principal_first_is_rejected() {
    //* Given
    let db = provisioned().await;
    let user = db
        .create_principal("Ada", "ada@example.test", "hash")
        .await
        .expect("failed to create principal");
    db.create_wish(&user.id, "a bicycle", None)
        .await
        .expect("failed to create wish");

    //* When
    // Out-of-order wipe: the principal still has referencing rows.
    let result = db.delete_all_rows("user").await;

    //* Then
    assert!(matches!(result, Err(Error::Db(_))));
    assert_eq!(db.table_row_count("user").await.unwrap(), 1);
}
