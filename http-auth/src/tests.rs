//! Service-level tests against a provisioned store

use app_db::AppDb;
use chrono::Duration;

use crate::{AuthError, AuthService, RegisterError};

const SECRET: &str = "test-secret-at-least-32-characters-long!!!!";

async fn service() -> AuthService {
    let db = AppDb::provision().await.expect("failed to provision app db");
    AuthService::new(db, SECRET)
}

#[tokio::test]
async fn register_assigns_default_role() {
    //* Given
    let auth = service().await;

    //* When
    let user = auth
        .register("Ada", "ada@example.test", "password123")
        .await
        .expect("registration should succeed");

    //* Then
    assert_eq!(user.role, "user");
    assert_eq!(user.email, "ada@example.test");
}

#[tokio::test]
async fn register_twice_reports_already_exists() {
    //* Given
    let auth = service().await;
    auth.register("Ada", "ada@example.test", "password123")
        .await
        .expect("first registration should succeed");

    //* When
    let result = auth.register("Ada", "ada@example.test", "password123").await;

    //* Then
    assert!(matches!(result, Err(RegisterError::AlreadyExists)));
}

#[tokio::test]
async fn register_rejects_short_password() {
    //* Given
    let auth = service().await;

    //* When
    let result = auth.register("Ada", "ada@example.test", "short").await;

    //* Then
    assert!(matches!(result, Err(RegisterError::PasswordTooShort)));
}

#[tokio::test]
async fn sign_in_round_trips_session() {
    //* Given
    let auth = service().await;
    auth.register("Ada", "ada@example.test", "password123")
        .await
        .expect("registration should succeed");

    //* When
    let (user, token) = auth
        .sign_in("ada@example.test", "password123")
        .await
        .expect("sign-in should succeed");

    //* Then
    let (session, session_user) = auth
        .session_for_token(&token)
        .await
        .expect("token should resolve");
    assert_eq!(session.user_id, user.id);
    assert_eq!(session_user.email, "ada@example.test");
}

#[tokio::test]
async fn sign_in_rejects_wrong_password() {
    //* Given
    let auth = service().await;
    auth.register("Ada", "ada@example.test", "password123")
        .await
        .expect("registration should succeed");

    //* When
    let result = auth.sign_in("ada@example.test", "wrong-password").await;

    //* Then
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn forged_token_is_rejected_without_store_lookup() {
    //* Given
    let auth = service().await;

    //* When
    // Well-formed shape, wrong signature.
    let result = auth.session_for_token("some-session-id.deadbeef").await;

    //* Then
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn expired_session_is_rejected() {
    //* Given
    let db = AppDb::provision().await.expect("failed to provision app db");
    let auth = AuthService::new(db, SECRET).with_session_ttl(Duration::seconds(-1));
    auth.register("Ada", "ada@example.test", "password123")
        .await
        .expect("registration should succeed");
    let (_, token) = auth
        .sign_in("ada@example.test", "password123")
        .await
        .expect("sign-in should succeed");

    //* When
    let result = auth.session_for_token(&token).await;

    //* Then
    assert!(matches!(result, Err(AuthError::SessionExpired)));
}

#[tokio::test]
async fn sign_out_invalidates_token() {
    //* Given
    let auth = service().await;
    auth.register("Ada", "ada@example.test", "password123")
        .await
        .expect("registration should succeed");
    let (_, token) = auth
        .sign_in("ada@example.test", "password123")
        .await
        .expect("sign-in should succeed");

    //* When
    auth.sign_out(&token).await.expect("sign-out should succeed");

    //* Then
    let result = auth.session_for_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}
