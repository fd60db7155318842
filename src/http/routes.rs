//! HTTP route definitions

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    players: usize,
    coins: usize,
    peers: usize,
    snapshots_sent: u64,
}

impl HealthResponse {
    fn from_state(state: &AppState) -> Self {
        let (players, coins) = {
            let world = state.world.lock();
            (world.movers().len(), world.pickups().len())
        };

        Self {
            status: "ok",
            uptime_secs: uptime_secs(),
            players,
            coins,
            peers: state.sessions.len(),
            snapshots_sent: state.broadcaster.snapshots_sent(),
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_state(&state))
}
