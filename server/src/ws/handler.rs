use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::{header, HeaderMap},
    response::Response,
};
use std::net::SocketAddr;

use crate::auth::ConnectCredentials;
use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. Credentials are captured from the
/// upgrade request headers here (`Authorization: Bearer` for viewers,
/// `x-api-key` for cameras) but checked only when a join message
/// arrives — the connection stays unidentified until then.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let credentials = extract_credentials(&headers);
    tracing::info!(peer = %addr, "client connected");
    ws.on_upgrade(move |socket| actor::run_connection(socket, state, credentials))
}

fn extract_credentials(headers: &HeaderMap) -> ConnectCredentials {
    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    ConnectCredentials {
        bearer_token,
        api_key,
    }
}
