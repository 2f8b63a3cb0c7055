//! Shared HTTP plumbing: error responses and transport binding.

use std::{fmt::Display, future::Future, net::SocketAddr};

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    serve::{Listener as _, ListenerExt as _},
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type BoxRequestError = Box<dyn RequestError>;

/// An error that can be reported to an HTTP caller.
///
/// Handlers return domain error enums implementing this trait; the boxed form
/// renders a uniform JSON error body so callers can always distinguish
/// failure from success.
pub trait RequestError: Display + Send + Sync + 'static {
    fn error_code(&self) -> &'static str;
    fn status_code(&self) -> StatusCode;
}

impl IntoResponse for BoxRequestError {
    fn into_response(self) -> axum::response::Response {
        let res = json!({
            "error_code": self.error_code(),
            "error_message": self.to_string(),
        });

        (self.status_code(), res.to_string()).into_response()
    }
}

impl<E: RequestError> From<E> for BoxRequestError {
    fn from(e: E) -> Self {
        Box::new(e)
    }
}

/// Errors that can occur when binding the HTTP listener
#[derive(Debug, Error)]
pub enum BindError {
    /// Failed to bind the TCP listener
    ///
    /// This occurs when:
    /// - The address is already in use by another process
    /// - The port requires elevated privileges (e.g., port < 1024)
    /// - The address is not available on this system
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to get the local address from the bound listener
    #[error("failed to get local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Binds `app` to `at` and returns the bound address plus a future that runs
/// the server.
///
/// The returned future resolves only on graceful shutdown (SIGINT/SIGTERM) or
/// on a transport error. The bound address is reported back so harnesses can
/// coordinate against an ephemeral port.
pub async fn serve_at(
    at: SocketAddr,
    app: Router,
) -> Result<(SocketAddr, impl Future<Output = Result<(), BoxError>>), BindError> {
    let listener = TcpListener::bind(at)
        .await
        .map_err(|source| BindError::Bind { addr: at, source })?
        .tap_io(|tcp_stream| {
            if let Err(err) = tcp_stream.set_nodelay(true) {
                tracing::warn!(error = %err, "failed to set TCP_NODELAY");
            }
        });
    let bound_addr = listener.local_addr().map_err(BindError::LocalAddr)?;

    let fut = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "server error");
                err.into()
            })
    };

    Ok((bound_addr, fut))
}

/// Returns a future that completes when a shutdown signal is received.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => tracing::info!(signal="SIGINT", "shutdown signal"),
            _ = sigterm.recv() => tracing::info!(signal="SIGTERM", "shutdown signal"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("shutdown signal");
    }
}
