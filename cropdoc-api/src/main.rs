//! cropdoc-api - REST backend for the CropDoc plant-disease-diagnosis platform
//!
//! Farmers submit plant photos for diagnosis, agronomists review the
//! automated predictions, admins manage accounts and the AI-model registry.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cropdoc_api::{build_router, AppState};
use cropdoc_common::config;
use cropdoc_common::db::init::init_database;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "cropdoc-api", about = "CropDoc REST backend")]
struct Args {
    /// Root folder holding the database (overrides env and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, env = "CROPDOC_PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting CropDoc API (cropdoc-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Resolve root folder (CLI > env > config file > platform default)
    let root_folder = config::resolve_root_folder(args.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    // Startup housekeeping: drop expired sessions
    let expired = cropdoc_api::db::sessions::delete_expired(&pool).await?;
    if expired > 0 {
        info!("Removed {} expired sessions", expired);
    }

    // Daily notification retention cleanup
    cropdoc_api::services::notifier::spawn_cleanup_task(pool.clone());

    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!("cropdoc-api listening on http://0.0.0.0:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
