//! Privileged-principal seeding.
//!
//! Seeding goes through the identity collaborator for registration, then
//! elevates the role directly in the store: registration itself never grants
//! privilege.

use http_auth::{AuthService, RegisterError};
use thiserror::Error;
use tracing::instrument;

use app_db::AppDb;

use crate::config::AdminCredentials;

/// Errors that can occur when seeding the privileged principal
#[derive(Debug, Error)]
pub enum SeedError {
    /// Registration failed for a reason other than "already exists".
    #[error("failed to register the admin principal: {0}")]
    Register(#[source] RegisterError),

    /// The role mutation failed, or matched no principal row after a
    /// registration that should have created one.
    #[error("failed to elevate the admin principal: {0}")]
    Elevate(#[source] app_db::Error),
}

/// Creates the well-known admin principal and elevates its role.
///
/// Idempotent: a principal that already exists is not an error, so the seeder
/// can run both at startup and after every wipe. On success exactly one
/// privileged principal exists.
#[instrument(skip_all, err)]
pub async fn seed_admin(
    db: &AppDb,
    auth: &AuthService,
    admin: &AdminCredentials,
) -> Result<(), SeedError> {
    match auth
        .register(&admin.name, &admin.email, &admin.password)
        .await
    {
        Ok(_) => {}
        Err(RegisterError::AlreadyExists) => {
            tracing::debug!(email = %admin.email, "admin principal already present");
        }
        Err(err) => return Err(SeedError::Register(err)),
    }

    db.set_user_role(&admin.email, app_db::ADMIN_ROLE)
        .await
        .map_err(SeedError::Elevate)
}
