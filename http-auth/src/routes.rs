//! Identity route tree mounted by the request surface composer.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use http_common::{BoxRequestError, RequestError};
use serde::Deserialize;

use crate::{AuthService, CurrentUser, RegisterError};

/// Builds the identity route tree. Callers mount this under their auth prefix.
pub fn router(auth: AuthService) -> Router {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
        .route("/session", get(session))
        .with_state(auth)
}

impl RequestError for RegisterError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegisterError::AlreadyExists => StatusCode::CONFLICT,
            RegisterError::PasswordTooShort => StatusCode::BAD_REQUEST,
            RegisterError::Hash(_) | RegisterError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RegisterError::AlreadyExists => "USER_ALREADY_EXISTS",
            RegisterError::PasswordTooShort => "PASSWORD_TOO_SHORT",
            RegisterError::Hash(_) => "HASH_ERROR",
            RegisterError::Store(_) => "STORE_ERROR",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignUpRequest {
    name: String,
    email: String,
    password: String,
}

async fn sign_up(
    State(auth): State<AuthService>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), BoxRequestError> {
    let user = auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user })),
    ))
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

async fn sign_in(
    State(auth): State<AuthService>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<serde_json::Value>, crate::AuthError> {
    let (user, token) = auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(serde_json::json!({ "token": token, "user": user })))
}

async fn sign_out(
    State(auth): State<AuthService>,
    current: CurrentUser,
) -> Result<Json<serde_json::Value>, crate::AuthError> {
    auth.sign_out(&current.session.token).await?;
    Ok(Json(serde_json::json!({ "status": "signed-out" })))
}

async fn session(current: CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user": current.user,
        "session": { "expires_at": current.session.expires_at },
    }))
}
