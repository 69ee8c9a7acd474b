pub mod actor;
pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;

/// Type alias for the sender half of a WebSocket connection's channel.
/// The registry and broadcast paths clone this to push frames to a
/// specific client; the connection's writer task owns the socket sink.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
