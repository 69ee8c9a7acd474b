//! Actor-per-connection supervisor.
//!
//! Each accepted WebSocket gets a writer task (owns the sink, drains an
//! mpsc channel), a ping task, and this reader loop driving the session
//! state machine. The connection's registry entry is created by its
//! join message and removed exactly once when the loop ends, whatever
//! the cause (client close, transport error, forced termination).

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::auth::ConnectCredentials;
use crate::presence;
use crate::registry::ConnectionId;
use crate::state::AppState;
use crate::ws::protocol::{self, Flow, Session};

/// Ping interval: server sends a WebSocket ping every 30 seconds so
/// abrupt disconnects cannot leak registry entries indefinitely.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if no pong arrives within 10 seconds after a ping,
/// the connection is closed.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// How long teardown waits for the writer to flush queued frames
/// (final error/close included) to a peer that may have stopped reading.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the actor for one accepted WebSocket connection.
pub async fn run_connection(socket: WebSocket, state: AppState, credentials: ConnectCredentials) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let handle = ConnectionId::next();
    let mut session = Session::Unidentified;

    tracing::debug!(connection = %handle, "WebSocket actor started");

    // Writer task: forwards mpsc messages to the WebSocket sink
    let mut writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died — connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: each frame is fully handled (including any registry
    // mutation) before the next one is read, preserving per-connection
    // inbound order.
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    let flow = protocol::handle_text(
                        &text,
                        &mut session,
                        handle,
                        &credentials,
                        &tx,
                        &state,
                    )
                    .await;
                    if flow == Flow::Terminate {
                        break;
                    }
                }
                Message::Binary(data) => {
                    // The wire contract is JSON text frames
                    tracing::debug!(
                        connection = %handle,
                        len = data.len(),
                        "ignoring binary frame"
                    );
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::debug!(
                        connection = %handle,
                        reason = ?frame,
                        "client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    connection = %handle,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                tracing::debug!(connection = %handle, "WebSocket stream ended");
                break;
            }
        }
    }

    ping_handle.abort();
    let _ = ping_handle.await;

    // Remove the registry entry before draining the writer: unregister
    // yields the record only on the first call, so the leave
    // announcement fires exactly once per connection.
    match state.registry.unregister(handle) {
        Some(record) => {
            tracing::info!(
                kind = record.kind().as_str(),
                id = %record.id(),
                connection = %handle,
                "participant disconnected"
            );
            presence::announce_leave(&state.registry, &record);
        }
        None => {
            tracing::debug!(connection = %handle, "unidentified client disconnect");
        }
    }

    // All sender clones are gone now (registry entry removed, ping task
    // finished); dropping ours lets the writer drain queued frames —
    // including any final error/close — before the socket is dropped.
    drop(tx);
    if timeout(WRITER_DRAIN_TIMEOUT, &mut writer_handle).await.is_err() {
        writer_handle.abort();
    }

    tracing::debug!(connection = %handle, "WebSocket actor stopped");
}

/// Writer task: receives messages from the mpsc channel and forwards
/// them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
