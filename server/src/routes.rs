use axum::{Json, Router};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// GET /api/relay/info — Public endpoint returning the relay's version
/// and current participant counts. Used by the platform dashboard to
/// show live population without opening a WebSocket.
async fn relay_info(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let (viewers, cameras) = state.registry.counts();
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "viewers": viewers,
        "cameras": cameras,
    }))
}

/// Build the full axum Router.
pub fn build_router(state: AppState) -> Router {
    // WebSocket endpoint (credentials via headers, checked at join)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Public routes (no auth required)
    let public_routes =
        Router::new().route("/api/relay/info", axum::routing::get(relay_info));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(ws_routes)
        .merge(public_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
