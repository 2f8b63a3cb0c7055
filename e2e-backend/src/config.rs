//! Environment configuration for the e2e backend.
//!
//! Everything here is deliberately fixed: the backend serves a test harness,
//! not operators. The well-known values are configuration constants supplied
//! at construction time so alternate environments can substitute them, but
//! they are not meant to vary between runs.

use std::net::{IpAddr, Ipv4Addr};

/// Environment variable selecting the listen port.
pub const PORT_ENV_VAR: &str = "E2E_BACKEND_PORT";

/// Default listen port when the env var is unset or non-numeric.
pub const DEFAULT_PORT: u16 = 3000;

/// The backend binds all interfaces so the harness can reach it from
/// containers or sibling processes.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Origins allowed to perform cross-origin calls against the backend.
pub const TRUSTED_ORIGINS: &[&str] = &["http://localhost:5173"];

/// Shared secret used to sign session tokens.
pub const SESSION_SECRET: &str = "e2e-test-secret-at-least-32-characters-long!!";

/// The fixed credentials of the single privileged test principal.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            name: "Admin E2E".to_string(),
            email: "admin@e2e.test".to_string(),
            password: "password123".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub session_secret: String,
    pub admin: AdminCredentials,
}

impl Config {
    /// Builds the configuration from the environment.
    ///
    /// A missing or non-numeric `E2E_BACKEND_PORT` falls back to the default
    /// port rather than failing startup.
    pub fn from_env() -> Self {
        let port = std::env::var(PORT_ENV_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            bind_addr: BIND_ADDR,
            port,
            cors_origins: TRUSTED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            session_secret: SESSION_SECRET.to_string(),
            admin: AdminCredentials::default(),
        }
    }
}
