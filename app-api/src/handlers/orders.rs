//! Handlers for orders

use axum::{Json, extract::State, http::StatusCode};
use http_auth::CurrentUser;
use http_common::{BoxRequestError, RequestError};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::Ctx;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("unknown deposit point: {0}")]
    UnknownDepositPoint(String),

    #[error("failed to access the order store: {0}")]
    Store(app_db::Error),
}

impl RequestError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::UnknownDepositPoint(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            OrderError::UnknownDepositPoint(_) => "UNKNOWN_DEPOSIT_POINT",
            OrderError::Store(_) => "STORE_ERROR",
        }
    }
}

pub async fn list_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
) -> Result<Json<Vec<app_db::Order>>, BoxRequestError> {
    let orders = ctx
        .db
        .list_orders(&current.user.id)
        .await
        .map_err(OrderError::Store)?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    deposit_point_id: String,
}

#[instrument(skip_all, err)]
pub async fn create_handler(
    State(ctx): State<Ctx>,
    current: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), BoxRequestError> {
    let id = ctx
        .db
        .create_order(&current.user.id, &payload.deposit_point_id)
        .await
        .map_err(|err| {
            // A foreign key rejection here can only mean the referenced
            // deposit point does not exist.
            if let app_db::Error::Db(sqlx::Error::Database(db_err)) = &err
                && db_err.message().contains("FOREIGN KEY")
            {
                return OrderError::UnknownDepositPoint(payload.deposit_point_id.clone());
            }
            OrderError::Store(err)
        })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
