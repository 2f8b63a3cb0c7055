//! Application database handle and provisioning.
//!
//! The backing store is a disposable SQLite database provisioned into a
//! process-owned temporary directory. It lives for exactly one process: the
//! temporary directory is removed when the handle is dropped, and nothing in
//! this crate supports reconnecting to a previous store.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

mod conn;
mod domain;
mod sessions;
mod users;

pub use self::{
    conn::{ConnError, DbConnPool},
    domain::{Basket, DepositPoint, Order, Wish},
    sessions::Session,
    users::{ADMIN_ROLE, DEFAULT_ROLE, User},
};

/// Default pool size for the application DB.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// All mutable tables, in the one deletion order consistent with the schema's
/// reference graph: tables referencing a principal or an order first, then the
/// tables they reference, then `user` last.
///
/// The reset endpoint iterates this slice verbatim. A new table must be
/// inserted before everything it references and after everything that
/// references it.
pub const WIPE_ORDER: [&str; 8] = [
    "wish",
    "basket",
    "\"order\"",
    "deposit_point",
    "session",
    "account",
    "verification",
    "user",
];

/// Whether to keep the temporary directory after the handle is dropped
///
/// This is set to `false` by default, but can be overridden by the
/// `KEEP_TEMP_DIRS` environment variable.
pub static KEEP_TEMP_DIRS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("KEEP_TEMP_DIRS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
});

/// Errors that can occur when provisioning the backing store.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The temporary directory for the database file could not be created.
    #[error("failed to allocate backing storage: {0}")]
    Storage(#[source] std::io::Error),

    /// The freshly created database could not be opened.
    #[error("failed to open provisioned database: {0}")]
    Connect(#[source] sqlx::Error),

    /// The schema could not be materialized.
    #[error("failed to materialize schema: {0}")]
    Schema(#[source] sqlx::migrate::MigrateError),
}

impl From<ConnError> for ProvisionError {
    fn from(err: ConnError) -> Self {
        match err {
            ConnError::ConnectionError(err) => ProvisionError::Connect(err),
            ConnError::MigrationFailed(err) => ProvisionError::Schema(err),
        }
    }
}

/// Errors that can occur when operating on the application DB.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error executing database query: {0}")]
    Db(#[from] sqlx::Error),

    /// A principal with this email already exists.
    #[error("a principal with email {email} already exists")]
    EmailTaken { email: String },

    /// A role mutation matched no principal row. This is a consistency fault:
    /// the caller believed the principal existed.
    #[error("no principal found with email {email} to change role")]
    RoleTargetMissing { email: String },
}

/// Handle to the provisioned application DB. Clones refer to the same store.
#[derive(Clone, Debug)]
pub struct AppDb {
    pub pool: DbConnPool,
    url: Arc<str>,
    _temp_dir: Option<Arc<TempDir>>,
}

impl AppDb {
    /// Provisions a fresh, isolated backing store and materializes the schema.
    ///
    /// Intended to be called exactly once per process, at startup. The
    /// returned handle owns the temporary directory holding the database
    /// file; it is deleted on process exit unless `KEEP_TEMP_DIRS` is set.
    #[instrument(err)]
    pub async fn provision() -> Result<Self, ProvisionError> {
        let temp_dir = TempDir::with_prefix("wishpoint-e2e-").map_err(ProvisionError::Storage)?;
        let db_path = temp_dir.path().join("app.db");
        tracing::info!("provisioning app db at: {}", db_path.display());

        let url = format!("sqlite://{}", db_path.display());
        let pool = DbConnPool::connect(&url, DEFAULT_POOL_SIZE).await?;
        pool.run_migrations().await?;

        let temp_dir = if *KEEP_TEMP_DIRS {
            tracing::info!("keeping temp dir: {}", temp_dir.keep().display());
            None
        } else {
            Some(Arc::new(temp_dir))
        };

        Ok(Self {
            pool,
            url: url.into(),
            _temp_dir: temp_dir,
        })
    }

    /// The connection URL of the provisioned store.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Principal-related API
impl AppDb {
    /// Creates a principal with the default (non-privileged) role and its
    /// credential account row in a single transaction.
    ///
    /// Uniqueness is enforced by the store's constraint on the email column,
    /// not by a pre-check, so the loser of two registrations racing for the
    /// same email gets [`Error::EmailTaken`]. Nothing is written in that
    /// case.
    #[instrument(skip(self, password_hash), err)]
    pub async fn create_principal(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, Error> {
        let mut tx = self.pool.begin().await?;

        let user_id = Uuid::new_v4().to_string();
        users::insert(&mut *tx, &user_id, name, email)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    Error::EmailTaken {
                        email: email.to_string(),
                    }
                }
                other => Error::Db(other),
            })?;
        users::insert_account(
            &mut *tx,
            &Uuid::new_v4().to_string(),
            &user_id,
            "credential",
            Some(password_hash),
        )
        .await?;

        tx.commit().await?;

        users::get_by_id(&*self.pool, &user_id)
            .await?
            .ok_or_else(|| Error::RoleTargetMissing {
                email: email.to_string(),
            })
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        Ok(users::get_by_email(&*self.pool, email).await?)
    }

    pub async fn user_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        Ok(users::get_by_id(&*self.pool, id).await?)
    }

    pub async fn count_users_with_role(&self, role: &str) -> Result<i64, Error> {
        Ok(users::count_by_role(&*self.pool, role).await?)
    }

    /// Sets the role of the principal with the given email.
    ///
    /// This is the explicit escalation path used by the seeder; registration
    /// itself never grants privilege. A missing principal row is surfaced as
    /// [`Error::RoleTargetMissing`], not swallowed.
    #[instrument(skip(self), err)]
    pub async fn set_user_role(&self, email: &str, role: &str) -> Result<(), Error> {
        let updated = users::set_role_by_email(&*self.pool, email, role).await?;
        if updated == 0 {
            return Err(Error::RoleTargetMissing {
                email: email.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the credential hash (and owning user id) for the given email.
    pub async fn password_hash_for_email(
        &self,
        email: &str,
    ) -> Result<Option<(String, String)>, Error> {
        Ok(users::get_password_hash(&*self.pool, email).await?)
    }
}

/// Session-related API
impl AppDb {
    pub async fn insert_session(
        &self,
        id: &str,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sessions::insert(&*self.pool, id, user_id, token, expires_at).await?;
        Ok(())
    }

    pub async fn session_by_token(&self, token: &str) -> Result<Option<Session>, Error> {
        Ok(sessions::get_by_token(&*self.pool, token).await?)
    }

    pub async fn delete_session_by_token(&self, token: &str) -> Result<(), Error> {
        sessions::delete_by_token(&*self.pool, token).await?;
        Ok(())
    }
}

/// Maintenance API used by the e2e reset endpoint
impl AppDb {
    /// Deletes every row of the given table.
    ///
    /// The caller is responsible for issuing deletions in [`WIPE_ORDER`]; the
    /// engine enforces referential integrity and rejects deletes of rows that
    /// are still referenced.
    #[instrument(skip(self), err)]
    pub async fn delete_all_rows(&self, table: &str) -> Result<u64, Error> {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of rows currently in the given table.
    pub async fn table_row_count(&self, table: &str) -> Result<i64, Error> {
        Ok(sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&*self.pool)
            .await?)
    }
}

/// Business-domain API
impl AppDb {
    pub async fn create_wish(
        &self,
        user_id: &str,
        title: &str,
        url: Option<&str>,
    ) -> Result<String, Error> {
        let id = Uuid::new_v4().to_string();
        domain::insert_wish(&*self.pool, &id, user_id, title, url).await?;
        Ok(id)
    }

    pub async fn list_wishes(&self, user_id: &str) -> Result<Vec<Wish>, Error> {
        Ok(domain::list_wishes_by_user(&*self.pool, user_id).await?)
    }

    pub async fn create_basket(&self, user_id: &str, status: &str) -> Result<String, Error> {
        let id = Uuid::new_v4().to_string();
        domain::insert_basket(&*self.pool, &id, user_id, status).await?;
        Ok(id)
    }

    pub async fn list_baskets(&self, user_id: &str) -> Result<Vec<Basket>, Error> {
        Ok(domain::list_baskets_by_user(&*self.pool, user_id).await?)
    }

    pub async fn create_order(
        &self,
        user_id: &str,
        deposit_point_id: &str,
    ) -> Result<String, Error> {
        let id = Uuid::new_v4().to_string();
        domain::insert_order(&*self.pool, &id, user_id, deposit_point_id).await?;
        Ok(id)
    }

    pub async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, Error> {
        Ok(domain::list_orders_by_user(&*self.pool, user_id).await?)
    }

    pub async fn create_deposit_point(
        &self,
        name: &str,
        address: &str,
        created_by: &str,
    ) -> Result<String, Error> {
        let id = Uuid::new_v4().to_string();
        domain::insert_deposit_point(&*self.pool, &id, name, address, created_by).await?;
        Ok(id)
    }

    pub async fn list_deposit_points(&self) -> Result<Vec<DepositPoint>, Error> {
        Ok(domain::list_deposit_points(&*self.pool).await?)
    }
}

#[cfg(test)]
mod tests;
