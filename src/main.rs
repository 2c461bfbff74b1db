//! Peercache - a distributed in-memory group cache server
//!
//! One node of the cluster: exposes a group over HTTP, answers peer
//! fetches for keys it owns, and loads cold keys from a file-backed
//! origin directory.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::{create_router, AppState, Config, FileSource, HttpPool, Registry, Source};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the served group with its file-backed origin
/// 4. Wire the peer pool onto the group
/// 5. Create the Axum router and start the HTTP server
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Peercache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: group={}, max_bytes={}, port={}, sweep_interval={}s, peers={}",
        config.group_name,
        config.max_bytes,
        config.server_port,
        config.sweep_interval,
        config.peers.len()
    );

    // Register the served group over its file-backed origin
    let registry = Arc::new(Registry::new());
    let source = Arc::new(FileSource::new(config.origin_dir.clone())) as Arc<dyn Source>;
    let group = registry.new_group_with_sweep(
        config.group_name.clone(),
        config.max_bytes,
        Duration::from_secs(config.sweep_interval),
        source,
    );
    info!(group = %group.name(), "group registered");

    // Wire peer routing onto the group
    let pool = HttpPool::with_replicas(config.self_addr.clone(), config.replicas);
    let mut members = config.peers.clone();
    if !members.contains(&config.self_addr) {
        members.push(config.self_addr.clone());
    }
    pool.set_peers(&members);
    group.register_peers(Arc::new(pool));
    info!(members = members.len(), "peer pool configured");

    // Create router with all endpoints
    let app = create_router(AppState::new(registry));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server port");
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
