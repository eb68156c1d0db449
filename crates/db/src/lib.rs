//! SeaORM connection factory, migration runner and cancellable store calls.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Open a pooled connection using the configured limits.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    tracing::info!(
        target: "bookshelf-db",
        url = %settings.redacted_url(),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
        .sqlx_logging(settings.sqlx_logging);

    Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", settings.redacted_url()))
}

/// Apply the migrations `M` has not yet recorded in `seaql_migrations`.
/// Applied migrations are skipped, so a second run is a no-op.
pub async fn run_migrations<M: MigratorTrait>(db: &DatabaseConnection) -> anyhow::Result<()> {
    let pending = M::get_pending_migrations(db)
        .await
        .context("failed to read applied migrations")?;

    if pending.is_empty() {
        tracing::info!(target: "bookshelf-db", "schema is up to date");
        return Ok(());
    }

    for migration in &pending {
        tracing::info!(
            target: "bookshelf-db",
            migration = migration.name(),
            "applying migration"
        );
    }

    M::up(db, None).await.context("migration failed")
}

/// Failure of a single store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl StoreError {
    /// True when the store rejected a write because of a unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Db(err) => matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))),
            Self::Cancelled => false,
        }
    }
}

/// Run a store call until it finishes or `cancel` fires, whichever comes first.
/// A cancelled call is dropped, which releases its pooled connection.
pub async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, DbErr>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = call => result.map_err(StoreError::from),
    }
}
