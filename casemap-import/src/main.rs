//! casemap-import - case report import service
//!
//! Accepts CSV and spreadsheet uploads of dengue case reports, geocodes each
//! row, and stores the resulting cases in the shared casemap database.

use anyhow::{Context, Result};
use casemap_common::config::{database_path, load_config, resolve_root_folder};
use casemap_common::logging::init_logging;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use casemap_import::config::resolve_settings;
use casemap_import::services::MinIntervalGate;
use casemap_import::AppState;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "casemap-import")]
#[command(about = "Case report import service")]
#[command(version)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "CASEMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(short, long, env = "CASEMAP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long, env = "CASEMAP_BIND_ADDRESS")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_config(args.config.as_deref())?;
    init_logging(&toml_config.logging)?;

    info!("Starting casemap-import");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = resolve_settings(&toml_config);

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;

    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let db_pool = casemap_import::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // One gate for the whole process: concurrent imports share the pacing
    let gate = Arc::new(MinIntervalGate::from_millis(
        settings.geocoding.min_interval_ms,
    ));
    let importer = casemap_import::build_importer(&db_pool, &settings, gate)?;

    let state = AppState::new(db_pool, Arc::new(importer));
    let app = casemap_import::build_router(state);

    let bind_address = args.bind.unwrap_or(toml_config.server.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("casemap-import stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
