//! Session-based identity collaborator.
//!
//! Owns registration, credential verification and session issuance against
//! the application DB. Registration never grants privilege; role elevation is
//! an explicit store mutation owned by whoever seeds the environment.

use std::sync::Arc;

use axum::{
    Json, RequestPartsExt as _,
    extract::FromRequestParts,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, typed_header::TypedHeaderRejectionReason};
use chrono::{Duration, Utc};
use headers::{Authorization, authorization::Bearer};
use sha2::{Digest as _, Sha256};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use app_db::{AppDb, Session, User};

pub mod routes;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// How long an issued session stays valid.
const SESSION_TTL_DAYS: i64 = 7;

/// Errors that can occur when registering a principal.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A principal with this email is already registered.
    ///
    /// Callers seeding a fixed principal treat this as success.
    #[error("a principal with this email is already registered")]
    AlreadyExists,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("error writing to the principal store: {0}")]
    Store(#[source] app_db::Error),
}

impl From<app_db::Error> for RegisterError {
    fn from(err: app_db::Error) -> Self {
        match err {
            app_db::Error::EmailTaken { .. } => RegisterError::AlreadyExists,
            other => RegisterError::Store(other),
        }
    }
}

/// Errors that can occur when authenticating a request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,

    #[error("Bearer token is empty")]
    EmptyToken,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Auth service not configured")]
    ServiceNotConfigured,

    #[error("password verification failed: {0}")]
    Hash(String),

    #[error("error accessing the session store: {0}")]
    Store(#[from] app_db::Error),
}

impl AuthError {
    /// Map AuthError variants to appropriate HTTP status codes
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeaderFormat
            | AuthError::EmptyToken
            | AuthError::InvalidToken
            | AuthError::SessionExpired
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            AuthError::ServiceNotConfigured | AuthError::Hash(_) | AuthError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get user-facing error message (hide internal details)
    pub fn user_message(&self) -> String {
        match self {
            AuthError::ServiceNotConfigured | AuthError::Hash(_) | AuthError::Store(_) => {
                "Authentication service error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.user_message(),
        }));

        (status, body).into_response()
    }
}

/// The identity collaborator service. Clones share the same store handle.
#[derive(Clone)]
pub struct AuthService {
    db: AppDb,
    /// Shared secret used to sign session tokens.
    secret: Arc<str>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(db: AppDb, secret: &str) -> Self {
        Self {
            db,
            secret: secret.into(),
            session_ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Registers a new principal with the default, non-privileged role.
    ///
    /// The password is hashed on the blocking pool; the user and account rows
    /// are written in one transaction, so a failed registration leaves no
    /// partial principal behind.
    #[instrument(skip(self, password), err)]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, RegisterError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(RegisterError::PasswordTooShort);
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| RegisterError::Hash(e.to_string()))?
            .map_err(|e| RegisterError::Hash(e.to_string()))?;

        let user = self.db.create_principal(name, email, &hash).await?;
        Ok(user)
    }

    /// Verifies credentials and issues a new signed session token.
    #[instrument(skip(self, password), err)]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let (user_id, stored_hash) = self
            .db
            .password_hash_for_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored_hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .db
            .user_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let session_id = Uuid::new_v4().to_string();
        let token = self.sign_token(&session_id);
        let expires_at = Utc::now() + self.session_ttl;
        self.db
            .insert_session(&session_id, &user.id, &token, expires_at)
            .await?;

        Ok((user, token))
    }

    /// Resolves a bearer token to its session and principal.
    ///
    /// The token signature is checked before the store is consulted, so
    /// malformed or forged tokens never produce a query.
    pub async fn session_for_token(&self, token: &str) -> Result<(Session, User), AuthError> {
        let (session_id, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        if self.token_signature(session_id) != signature {
            return Err(AuthError::InvalidToken);
        }

        let session = self
            .db
            .session_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session.expires_at < Utc::now() {
            self.db.delete_session_by_token(token).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .db
            .user_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok((session, user))
    }

    /// Deletes the session for the given token. Unknown tokens are a no-op.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.db.delete_session_by_token(token).await?;
        Ok(())
    }

    fn sign_token(&self, session_id: &str) -> String {
        format!("{session_id}.{}", self.token_signature(session_id))
    }

    fn token_signature(&self, session_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(session_id.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// The authenticated principal attached to a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<AuthService>()
            .ok_or(AuthError::ServiceNotConfigured)?
            .clone();

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|err| match err.reason() {
                TypedHeaderRejectionReason::Missing => AuthError::MissingAuthHeader,
                _ => AuthError::InvalidAuthHeaderFormat,
            })?;

        if bearer.token().is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let (session, user) = auth_service.session_for_token(bearer.token()).await?;

        Ok(CurrentUser { user, session })
    }
}

/// Layer that attaches the [`AuthService`] to every request, making the
/// [`CurrentUser`] extractor available to downstream handlers.
pub fn auth_layer(
    auth_service: AuthService,
) -> tower::util::MapRequestLayer<
    impl Fn(http::Request<axum::body::Body>) -> http::Request<axum::body::Body> + Clone,
> {
    tower::util::MapRequestLayer::new(move |mut req: http::Request<axum::body::Body>| {
        req.extensions_mut().insert(auth_service.clone());
        req
    })
}

#[cfg(test)]
mod tests;
