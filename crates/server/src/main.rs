use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rdflix_core::{
    build_indexers, load_config, validate_config, Config, DebridResolver, Indexer,
    RealDebridClient, StreamService,
};
use rdflix_server::{api::create_router, state::AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file used when `RDFLIX_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<()> {
    let config_path = std::env::var("RDFLIX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    info!(path = ?config_path, "Reading configuration");
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        version = VERSION,
        config_hash = %config_fingerprint(&config),
        "Configuration accepted"
    );
    if !config.debrid.is_configured() {
        warn!("No debrid API key configured; streams will be empty");
    }

    let config = Arc::new(config);
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let app = create_router(Arc::new(build_state(config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Short hash of the effective configuration, for correlating logs.
fn config_fingerprint(config: &Config) -> String {
    let json = serde_json::to_string(config).unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(json.as_bytes()));
    digest[..16].to_string()
}

/// Wire indexers, the debrid backend and the stream service.
fn build_state(config: Arc<Config>) -> AppState {
    let indexers = build_indexers(&config.indexers);
    if indexers.is_empty() {
        warn!("No indexers enabled");
    }
    for indexer in &indexers {
        info!(indexer = indexer.name(), "Indexer enabled");
    }

    let debrid = Arc::new(RealDebridClient::new(&config.debrid));
    info!(base_url = %config.debrid.base_url, "Debrid backend configured");
    let resolver = DebridResolver::new(debrid, config.debrid.clone());

    let service = StreamService::new(Arc::clone(&config), indexers, resolver);
    AppState::new(config, Arc::new(service))
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
