//! Bookshelf application library
//!
//! Authors and books modules plus the process lifecycle shared by the
//! `bookshelf-app` binary and `bookshelf-cli`.

pub mod entity;
pub mod migrator;
pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Register every module over `db` and bring the schema up to date.
pub async fn prepare(db: &DatabaseConnection) -> anyhow::Result<ModuleRegistry> {
    bookshelf_db::run_migrations::<migrator::Migrator>(db)
        .await
        .context("failed to apply migrations")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);

    Ok(registry)
}

/// Run the HTTP server until SIGINT or SIGTERM, then drain and close the pool.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.redacted_url(),
        "bookshelf starting"
    );

    let db = bookshelf_db::connect(&settings.database).await?;
    let registry = prepare(&db).await?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_shutdown().await;
            shutdown.cancel();
        }
    });

    let served = bookshelf_http::start_server(&registry, &settings, shutdown).await;

    if let Err(err) = registry.stop_modules().await {
        tracing::error!(error = ?err, "failed to stop modules");
    }
    db.close().await.context("failed to close database pool")?;

    tracing::info!("bookshelf stopped");
    served
}

/// Connect, apply pending migrations, and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let db = bookshelf_db::connect(&settings.database).await?;
    bookshelf_db::run_migrations::<migrator::Migrator>(&db)
        .await
        .context("failed to apply migrations")?;

    db.close().await.context("failed to close database pool")?;
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
