//! Handlers for baskets

use axum::{Json, extract::State, http::StatusCode};
use http_auth::CurrentUser;
use http_common::{BoxRequestError, RequestError};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::Ctx;

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("failed to access the basket store: {0}")]
    Store(#[from] app_db::Error),
}

impl RequestError for BasketError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_code(&self) -> &'static str {
        "STORE_ERROR"
    }
}

pub async fn list_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
) -> Result<Json<Vec<app_db::Basket>>, BoxRequestError> {
    let baskets = ctx
        .db
        .list_baskets(&current.user.id)
        .await
        .map_err(BasketError::Store)?;
    Ok(Json(baskets))
}

#[derive(Debug, Deserialize)]
pub struct CreateBasketRequest {
    #[serde(default = "default_status")]
    status: String,
}

fn default_status() -> String {
    "open".to_string()
}

#[instrument(skip_all, err)]
pub async fn create_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
    Json(payload): Json<CreateBasketRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), BoxRequestError> {
    let id = ctx
        .db
        .create_basket(&current.user.id, &payload.status)
        .await
        .map_err(BasketError::Store)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
