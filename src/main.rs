//! Coin Sync Server - authoritative world and snapshot broadcast
//!
//! Accepts WebSocket peers on `/ws`, applies their direction commands as they
//! arrive, and broadcasts the world state every tick.

use tokio::net::TcpListener;
use tracing::info;

use coin_sync::app::AppState;
use coin_sync::config::Config;
use coin_sync::http::build_router;
use coin_sync::util::logging::init_tracing;
use coin_sync::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);
    init_server_time();

    info!("Starting Coin Sync Server");
    info!(
        tick_rate = config.tick_rate,
        coin_spawn_interval = config.coin_spawn_interval,
        artificial_latency = config.artificial_latency,
        world_width = config.world_width,
        world_height = config.world_height,
        "Simulation settings"
    );

    let state = AppState::new(config.clone());
    let _loops = state.spawn_loops();

    let router = build_router(state);

    let listener = TcpListener::bind(config.server_addr).await?;
    info!("Server listening on {}", config.server_addr);
    info!("WebSocket endpoint: ws://{}/ws", config.server_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
