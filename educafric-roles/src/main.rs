//! educafric-roles - multi-role detection service
//!
//! Serves role detection, multi-role registration and role/school switching
//! over HTTP, backed by `educafric.db` in the root folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use educafric_common::config::{prepare_root_folder, resolve_root_folder, TomlConfig};
use educafric_common::db::init_database;
use educafric_roles::db::sessions::purge_expired_sessions;
use educafric_roles::{build_router, AppState, AuthConfig};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments for educafric-roles
#[derive(Parser, Debug)]
#[command(name = "educafric-roles")]
#[command(about = "Multi-role detection service for EDUCAFRIC")]
#[command(version)]
struct Args {
    /// Root folder holding educafric.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "EDUCAFRIC_PORT")]
    port: Option<u16>,

    /// Explicit TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("educafric_roles={0},educafric_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting EDUCAFRIC Roles (educafric-roles) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = prepare_root_folder(&root_folder)
        .with_context(|| format!("Failed to prepare root folder {}", root_folder.display()))?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    match purge_expired_sessions(&pool).await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired session(s)", purged),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }

    let auth = AuthConfig::from(&config);
    if !auth.require_auth {
        warn!("Authentication disabled (require_auth = false)");
    }

    let app = build_router(AppState::new(pool, auth));

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("educafric-roles listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
