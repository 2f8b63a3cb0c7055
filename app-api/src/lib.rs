//! Request surface composer.
//!
//! Assembles the application's normal handler graph over one shared store
//! handle: cross-origin policy, the identity collaborator's session layer and
//! routes, and the business-domain route tree. Pure assembly; the only
//! failure mode is propagating misconfiguration.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use http_auth::AuthService;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

use app_db::AppDb;

pub mod handlers;

use handlers::{baskets, deposit_points, orders, wishes};

/// The business-route context
#[derive(Clone)]
pub struct Ctx {
    pub db: AppDb,
}

/// Errors that can occur when composing the request surface
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A configured cross-origin host is not a valid header value.
    #[error("invalid CORS origin: {origin}")]
    InvalidCorsOrigin { origin: String },
}

/// Composes the full request surface bound to `db`.
///
/// An empty `cors_origins` list is allowed and means no cross-origin calls
/// are permitted.
pub fn compose(
    db: AppDb,
    auth: AuthService,
    cors_origins: &[String],
) -> Result<Router, ComposeError> {
    let cors = cors_layer(cors_origins)?;

    let app = Router::new()
        .nest("/api/auth", http_auth::routes::router(auth.clone()))
        .nest("/api", business_router(Ctx { db }))
        .layer(http_auth::auth_layer(auth))
        .layer(cors);

    Ok(app)
}

/// The business-domain route tree.
fn business_router(ctx: Ctx) -> Router {
    Router::new()
        .route(
            "/wishes",
            get(wishes::list_handler).post(wishes::create_handler),
        )
        .route(
            "/baskets",
            get(baskets::list_handler).post(baskets::create_handler),
        )
        .route(
            "/orders",
            get(orders::list_handler).post(orders::create_handler),
        )
        .route(
            "/deposit-points",
            get(deposit_points::list_handler).post(deposit_points::create_handler),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(ctx)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ComposeError> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ComposeError::InvalidCorsOrigin {
                    origin: origin.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
