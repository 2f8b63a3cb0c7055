//! Handlers for deposit points
//!
//! Listing is public; creation is restricted to administrator principals.

use axum::{Json, extract::State, http::StatusCode};
use http_auth::CurrentUser;
use http_common::{BoxRequestError, RequestError};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::Ctx;

#[derive(Debug, Error)]
pub enum DepositPointError {
    #[error("only administrators can create deposit points")]
    NotAuthorized,

    #[error("failed to access the deposit point store: {0}")]
    Store(#[from] app_db::Error),
}

impl RequestError for DepositPointError {
    fn status_code(&self) -> StatusCode {
        match self {
            DepositPointError::NotAuthorized => StatusCode::FORBIDDEN,
            DepositPointError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            DepositPointError::NotAuthorized => "NOT_AUTHORIZED",
            DepositPointError::Store(_) => "STORE_ERROR",
        }
    }
}

pub async fn list_handler(
    State(ctx): State<Ctx>,
) -> Result<Json<Vec<app_db::DepositPoint>>, BoxRequestError> {
    let points = ctx
        .db
        .list_deposit_points()
        .await
        .map_err(DepositPointError::Store)?;
    Ok(Json(points))
}

#[derive(Debug, Deserialize)]
pub struct CreateDepositPointRequest {
    name: String,
    address: String,
}

#[instrument(skip_all, err)]
pub async fn create_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
    Json(payload): Json<CreateDepositPointRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), BoxRequestError> {
    if current.user.role != app_db::ADMIN_ROLE {
        return Err(DepositPointError::NotAuthorized.into());
    }

    let id = ctx
        .db
        .create_deposit_point(&payload.name, &payload.address, &current.user.id)
        .await
        .map_err(DepositPointError::Store)?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
