//! The maintenance endpoint that returns the store to its post-seed state.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use http_auth::AuthService;
use http_common::{BoxRequestError, RequestError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use app_db::AppDb;

use crate::{config::AdminCredentials, seed, seed::SeedError};

/// Context for the reset endpoint
#[derive(Clone)]
pub struct ResetCtx {
    db: AppDb,
    auth: AuthService,
    admin: Arc<AdminCredentials>,
    /// Serializes whole reset sequences. Two concurrent resets must not
    /// interleave their deletions.
    guard: Arc<Mutex<()>>,
}

impl ResetCtx {
    pub fn new(db: AppDb, auth: AuthService, admin: AdminCredentials) -> Self {
        Self {
            db,
            auth,
            admin: Arc::new(admin),
            guard: Arc::new(Mutex::new(())),
        }
    }
}

/// Builds the reset route.
pub fn router(ctx: ResetCtx) -> Router {
    Router::new()
        .route("/api/e2e/reset", post(handler))
        .with_state(ctx)
}

/// Errors that can occur during a reset
///
/// After either variant the store state is explicitly untrustworthy; the
/// caller must not proceed until a subsequent reset succeeds.
#[derive(Debug, Error)]
pub enum ResetError {
    /// A table wipe failed partway through the sequence. No reseed was
    /// attempted.
    #[error("failed to wipe table {table}: {source}")]
    Wipe {
        table: &'static str,
        #[source]
        source: app_db::Error,
    },

    /// The wipe completed but reseeding the privileged principal failed.
    #[error("failed to reseed the admin principal: {0}")]
    Seed(#[source] SeedError),
}

impl RequestError for ResetError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_code(&self) -> &'static str {
        match self {
            ResetError::Wipe { .. } => "WIPE_FAILED",
            ResetError::Seed(_) => "RESEED_FAILED",
        }
    }
}

/// Wipes every mutable table in dependency order, then reseeds the admin
/// principal.
///
/// Requests racing an in-progress reset may observe a partially wiped store;
/// the harness is expected to await reset completion before issuing further
/// traffic. A failed reset is reported, never retried here, and leaves the
/// endpoint ready for another attempt.
#[instrument(skip_all, err)]
pub async fn handler(
    State(ctx): State<ResetCtx>,
) -> Result<Json<serde_json::Value>, BoxRequestError> {
    let _guard = ctx.guard.lock().await;

    for table in app_db::WIPE_ORDER {
        ctx.db
            .delete_all_rows(table)
            .await
            .map_err(|source| ResetError::Wipe { table, source })?;
    }

    seed::seed_admin(&ctx.db, &ctx.auth, &ctx.admin)
        .await
        .map_err(ResetError::Seed)?;

    Ok(Json(serde_json::json!({ "status": "reset" })))
}
