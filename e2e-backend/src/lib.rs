//! Ephemeral backend for end-to-end test runs.
//!
//! Startup sequence: provision a disposable store, seed the single privileged
//! principal, compose the application's request surface, mount the reset
//! endpoint, bind. Any startup failure aborts; there is no partial-startup
//! mode. At runtime the only stateful operation is `POST /api/e2e/reset`,
//! which wipes all mutable data and reseeds the principal without restarting
//! the process.

use std::{future::Future, net::SocketAddr};

use http_auth::AuthService;
use http_common::{BindError, BoxError};
use thiserror::Error;

use app_db::{AppDb, ProvisionError};

pub mod config;
pub mod logging;
pub mod reset;
pub mod seed;

use config::Config;
use reset::ResetCtx;
use seed::SeedError;

/// Errors that can occur when starting the backend
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to provision the backing store: {0}")]
    Provision(#[from] ProvisionError),

    #[error("failed to seed the admin principal: {0}")]
    Seed(#[from] SeedError),

    #[error("failed to compose the request surface: {0}")]
    Compose(#[from] app_api::ComposeError),

    #[error("failed to bind the server: {0}")]
    Bind(#[from] BindError),
}

/// A running backend's handles, returned alongside the server future so tests
/// and harnesses can reach both the transport and the store.
pub struct App {
    pub addr: SocketAddr,
    pub db: AppDb,
}

/// Provisions, seeds, composes and binds the backend.
///
/// Returns the running app's handles and a future that serves until shutdown.
/// The future must be spawned (or awaited) to accept connections.
pub async fn serve(
    config: Config,
) -> Result<(App, impl Future<Output = Result<(), BoxError>>), StartError> {
    let db = AppDb::provision().await?;

    let auth = AuthService::new(db.clone(), &config.session_secret);
    seed::seed_admin(&db, &auth, &config.admin).await?;

    let surface = app_api::compose(db.clone(), auth.clone(), &config.cors_origins)?;
    let app = surface.merge(reset::router(ResetCtx::new(
        db.clone(),
        auth.clone(),
        config.admin.clone(),
    )));

    let at = SocketAddr::new(config.bind_addr, config.port);
    let (addr, server) = http_common::serve_at(at, app).await?;
    tracing::info!("e2e backend running on http://{addr}");

    Ok((App { addr, db }, server))
}
