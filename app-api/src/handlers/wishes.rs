//! Handlers for the wish list

use axum::{Json, extract::State, http::StatusCode};
use http_auth::CurrentUser;
use http_common::{BoxRequestError, RequestError};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::Ctx;

#[derive(Debug, Error)]
pub enum WishError {
    #[error("wish title must not be empty")]
    EmptyTitle,

    #[error("failed to access the wish store: {0}")]
    Store(#[from] app_db::Error),
}

impl RequestError for WishError {
    fn status_code(&self) -> StatusCode {
        match self {
            WishError::EmptyTitle => StatusCode::BAD_REQUEST,
            WishError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WishError::EmptyTitle => "EMPTY_TITLE",
            WishError::Store(_) => "STORE_ERROR",
        }
    }
}

pub async fn list_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
) -> Result<Json<Vec<app_db::Wish>>, BoxRequestError> {
    let wishes = ctx
        .db
        .list_wishes(&current.user.id)
        .await
        .map_err(WishError::Store)?;
    Ok(Json(wishes))
}

#[derive(Debug, Deserialize)]
pub struct CreateWishRequest {
    title: String,
    url: Option<String>,
}

#[instrument(skip_all, err)]
pub async fn create_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
    Json(payload): Json<CreateWishRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), BoxRequestError> {
    if payload.title.trim().is_empty() {
        return Err(WishError::EmptyTitle.into());
    }

    let id = ctx
        .db
        .create_wish(&current.user.id, &payload.title, payload.url.as_deref())
        .await
        .map_err(WishError::Store)?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
