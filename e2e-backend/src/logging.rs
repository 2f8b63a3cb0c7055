//! Logging configuration using tracing_subscriber.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

static WISHPOINT_LOG_ENV_VAR: &str = "WISHPOINT_LOG";

/// List of crates in the workspace.
const WORKSPACE_CRATES: &[&str] = &[
    "app_api",
    "app_db",
    "e2e_backend",
    "http_auth",
    "http_common",
];

/// Initializes a tracing subscriber for logging.
pub fn init() {
    // This function is also used to enable logging in tests, so wrap it in
    // `Once` to prevent multiple initializations.
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    // Parse directives from RUST_LOG
    let log_filter = EnvFilter::builder().with_default_directive(LevelFilter::ERROR.into());
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = log_filter.parse_lossy(&directive_string);

    let log_level = std::env::var(WISHPOINT_LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

    for crate_name in WORKSPACE_CRATES {
        // Add directives for each workspace crate, unless overridden by RUST_LOG
        if !directive_string.contains(&format!("{crate_name}="))
            && let Ok(directive) = format!("{crate_name}={log_level}").parse()
        {
            env_filter = env_filter.add_directive(directive);
        }
    }

    (env_filter, log_level)
}
