//! Application bootstrap shared by the server binary and the CLI.

use anyhow::Context;
use axum::Router;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry holding every module this application ships
pub fn registry() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry)?;
    Ok(registry)
}

/// Open the pool described by the database settings
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    let config = settings.database.db_config()?;
    Database::connect(&config)
        .await
        .with_context(|| "failed to connect to database")
}

/// Apply pending migrations of every registered module
pub async fn migrate(registry: &ModuleRegistry, db: &Database) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = db.run_migrations(&migrations).await?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Initialize modules, migrate, and build the router without binding a socket
pub async fn build_app(settings: &Settings, db: &Database) -> anyhow::Result<Router> {
    let registry = registry()?;
    let ctx = InitCtx { settings, db };

    registry.init_modules(&ctx).await?;
    migrate(&registry, db).await?;
    shelf_http::build_router(&registry, &ctx)
}

/// Run the server until Ctrl-C, then stop modules and drain the pool
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let registry = registry()?;
    let ctx = InitCtx {
        settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    migrate(&registry, &db).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &ctx, shutdown_signal()).await;

    registry.stop_modules().await?;
    db.close().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
