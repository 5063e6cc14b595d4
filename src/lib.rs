//! Bookshelf application library
//!
//! Wires the book catalogue module into the kernel registry and runs the
//! HTTP server around it.

pub mod modules;

use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build a registry holding every application module
pub fn build_registry(database: &Database) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, database)?;
    Ok(registry)
}

/// Connect the database, run the module lifecycle, and serve until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let database = settings.database.connect().await?;

    let registry = build_registry(&database)?;
    let ctx = InitCtx {
        settings: &settings,
        database: &database,
    };

    registry.init_all(&ctx).await?;
    registry.ensure_indexes(&database).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(
        &registry,
        &settings,
        &database,
        bookshelf_http::shutdown_signal(),
    )
    .await;

    registry.stop_all().await?;
    database.close();
    served
}
