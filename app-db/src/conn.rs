//! Internal connection pool implementation

use std::{str::FromStr as _, time::Duration};

use sqlx::{
    Pool, Sqlite,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::instrument;

/// Errors that can occur when connecting to the application DB.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
    /// Error opening the database file or connecting to it.
    #[error("Error connecting to application db: {0}")]
    ConnectionError(#[source] sqlx::Error),

    /// An error occurred while running migrations.
    #[error("Error running migrations: {0}")]
    MigrationFailed(#[source] MigrateError),
}

/// A connection pool to the application DB.
#[derive(Debug, Clone)]
pub struct DbConnPool(Pool<Sqlite>);

impl DbConnPool {
    /// Set up a connection pool to the application DB.
    ///
    /// Foreign key enforcement is switched on for every connection. The reset
    /// sequence relies on the engine rejecting deletes of still-referenced
    /// rows, so it must never be disabled.
    #[instrument(skip_all, err)]
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self, ConnError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(ConnError::ConnectionError)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map(Self)
            .map_err(ConnError::ConnectionError)
    }

    /// Runs migrations on the database.
    ///
    /// SQLx does the right things:
    /// - Never runs the same migration twice.
    /// - Errors on changes to old migrations.
    #[instrument(skip(self), err)]
    pub async fn run_migrations(&self) -> Result<(), ConnError> {
        static MIGRATOR: Migrator = sqlx::migrate!();
        MIGRATOR
            .run(&self.0)
            .await
            .map_err(ConnError::MigrationFailed)
    }
}

impl std::ops::Deref for DbConnPool {
    type Target = Pool<Sqlite>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for DbConnPool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
