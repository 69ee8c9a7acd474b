//! Wire protocol and per-frame dispatch.
//!
//! Every frame is a JSON text message `{ "event": string, "data": object }`
//! in both directions. Inbound frames parse into the closed [`ClientEvent`]
//! enum; anything else is a malformed message. Dispatch enforces the
//! session state machine: a connection stays unidentified until its first
//! join event and may only perform actions its role allows.

use axum::extract::ws::{CloseFrame, Message};
use serde::{Deserialize, Serialize};

use crate::auth::ConnectCredentials;
use crate::presence;
use crate::registry::{CameraInfo, ConnectionId, Participant, ParticipantKind, ViewerInfo};
use crate::signaling;
use crate::state::AppState;
use crate::ws::ConnectionSender;

/// WebSocket close codes (4000-range = application-defined):
/// 4001 = join rejected by identity verification
/// 4002 = protocol violation (wrong state or wrong role)
const CLOSE_UNAUTHORIZED: u16 = 4001;
const CLOSE_POLICY_VIOLATION: u16 = 4002;

/// Inbound events. `event` selects the variant, `data` carries the fields.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    ViewerConnect {
        id: String,
        #[serde(rename = "displayName")]
        display_name: String,
        role: String,
    },
    CameraConnect {
        id: String,
        name: String,
        location: String,
    },
    RequestListViewers,
    RequestListCameras,
    Offer(SignalPayload),
    Answer(SignalPayload),
    IceCandidate(IcePayload),
}

/// Directed SDP message: `id` is the sender's claimed id, `to` the target.
#[derive(Debug, Deserialize)]
pub struct SignalPayload {
    pub id: String,
    pub to: String,
    #[serde(rename = "type")]
    pub sdp_type: String,
    pub sdp: String,
}

/// Directed ICE candidate. Everything beyond the routing fields is an
/// opaque candidate payload forwarded untouched.
#[derive(Debug, Deserialize)]
pub struct IcePayload {
    pub id: String,
    pub to: String,
    #[serde(flatten)]
    pub candidate: serde_json::Map<String, serde_json::Value>,
}

/// Outbound events, serialized to the same `{event, data}` envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Presence announcement to cameras: a viewer joined.
    ViewerConnect { id: String },
    /// Presence announcement to viewers: a camera joined.
    CameraConnect(CameraInfo),
    ViewerDisconnect { id: String },
    CameraDisconnect { id: String },
    ResponseListViewers(Vec<ViewerSummary>),
    ResponseListCameras(Vec<CameraInfo>),
    Offer(ForwardedSignal),
    Answer(ForwardedSignal),
    IceCandidate(ForwardedIce),
    Error { message: String },
}

/// Entry of a `response-list-viewers` payload: viewers expose only ids.
#[derive(Debug, Serialize)]
pub struct ViewerSummary {
    pub id: String,
}

/// Relayed SDP message as delivered to its target.
#[derive(Debug, Serialize)]
pub struct ForwardedSignal {
    pub from: String,
    #[serde(rename = "type")]
    pub sdp_type: String,
    pub sdp: String,
}

/// Relayed ICE candidate: sender id plus the untouched candidate fields.
#[derive(Debug, Serialize)]
pub struct ForwardedIce {
    pub from: String,
    #[serde(flatten)]
    pub candidate: serde_json::Map<String, serde_json::Value>,
}

/// Identification state of one connection.
#[derive(Debug)]
pub enum Session {
    Unidentified,
    Viewer(ViewerInfo),
    Camera(CameraInfo),
}

impl Session {
    fn kind(&self) -> Option<ParticipantKind> {
        match self {
            Self::Unidentified => None,
            Self::Viewer(_) => Some(ParticipantKind::Viewer),
            Self::Camera(_) => Some(ParticipantKind::Camera),
        }
    }
}

/// Failure classified while handling one inbound frame.
///
/// Only `Malformed` leaves the connection open; the fatal variants
/// terminate it after the error event is sent.
#[derive(Debug)]
pub enum SessionError {
    /// Frame did not parse into a known envelope.
    Malformed(serde_json::Error),
    /// Action reserved for the other role, or issued before a join
    /// established that role.
    WrongRole { required: ParticipantKind },
    /// Signaling before any join identified the connection.
    NotIdentified,
    /// Identity verification rejected the join.
    Unauthorized,
}

impl SessionError {
    fn is_fatal(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }

    fn close_code(&self) -> u16 {
        match self {
            Self::Unauthorized => CLOSE_UNAUTHORIZED,
            _ => CLOSE_POLICY_VIOLATION,
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(_) => write!(f, "Malformed message"),
            Self::WrongRole {
                required: ParticipantKind::Viewer,
            } => write!(f, "Viewer unauthorized"),
            Self::WrongRole {
                required: ParticipantKind::Camera,
            } => write!(f, "Camera unauthorized"),
            Self::NotIdentified | Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

/// Whether the reader loop should keep the connection after a frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Handle one inbound text frame.
///
/// Errors are answered on this connection only: every failure produces
/// an `error` event, and fatal ones additionally queue a close frame
/// before asking the reader loop to stop.
pub async fn handle_text(
    text: &str,
    session: &mut Session,
    handle: ConnectionId,
    credentials: &ConnectCredentials,
    tx: &ConnectionSender,
    state: &AppState,
) -> Flow {
    match dispatch(text, session, handle, credentials, tx, state).await {
        Ok(()) => Flow::Continue,
        Err(err) => {
            send_error(tx, &err.to_string());
            if err.is_fatal() {
                tracing::warn!(
                    connection = %handle,
                    error = ?err,
                    "terminating connection"
                );
                let _ = tx.send(Message::Close(Some(CloseFrame {
                    code: err.close_code(),
                    reason: err.to_string().into(),
                })));
                Flow::Terminate
            } else {
                tracing::debug!(
                    connection = %handle,
                    error = ?err,
                    "rejected malformed frame"
                );
                Flow::Continue
            }
        }
    }
}

/// Parse and dispatch a frame against the current session state.
async fn dispatch(
    text: &str,
    session: &mut Session,
    handle: ConnectionId,
    credentials: &ConnectCredentials,
    tx: &ConnectionSender,
    state: &AppState,
) -> Result<(), SessionError> {
    let event: ClientEvent = serde_json::from_str(text).map_err(SessionError::Malformed)?;

    match event {
        ClientEvent::ViewerConnect {
            id,
            display_name,
            role,
        } => {
            if !state.verifier.verify_viewer(credentials, &id).await {
                return Err(SessionError::Unauthorized);
            }
            let info = ViewerInfo {
                id,
                display_name,
                role,
            };
            let record = Participant::Viewer(info.clone());
            state.registry.register(handle, record.clone(), tx.clone());
            presence::announce_join(&state.registry, &record);
            tracing::info!(id = %info.id, connection = %handle, "viewer connected");
            *session = Session::Viewer(info);
            Ok(())
        }
        ClientEvent::CameraConnect { id, name, location } => {
            if !state.verifier.verify_camera(credentials, &id).await {
                return Err(SessionError::Unauthorized);
            }
            let info = CameraInfo { id, name, location };
            let record = Participant::Camera(info.clone());
            state.registry.register(handle, record.clone(), tx.clone());
            presence::announce_join(&state.registry, &record);
            tracing::info!(id = %info.id, connection = %handle, "camera connected");
            *session = Session::Camera(info);
            Ok(())
        }
        ClientEvent::RequestListViewers => {
            require_role(session, ParticipantKind::Camera)?;
            let viewers = state
                .registry
                .list_viewers()
                .into_iter()
                .map(|v| ViewerSummary { id: v.id })
                .collect();
            send_event(tx, &ServerEvent::ResponseListViewers(viewers));
            Ok(())
        }
        ClientEvent::RequestListCameras => {
            require_role(session, ParticipantKind::Viewer)?;
            send_event(
                tx,
                &ServerEvent::ResponseListCameras(state.registry.list_cameras()),
            );
            Ok(())
        }
        ClientEvent::Offer(signal) => {
            require_role(session, ParticipantKind::Viewer)?;
            signaling::relay_offer(&state.registry, signal, tx);
            Ok(())
        }
        ClientEvent::Answer(signal) => {
            require_role(session, ParticipantKind::Camera)?;
            signaling::relay_answer(&state.registry, signal, tx);
            Ok(())
        }
        ClientEvent::IceCandidate(candidate) => {
            let kind = session.kind().ok_or(SessionError::NotIdentified)?;
            signaling::relay_ice(&state.registry, kind, candidate, tx);
            Ok(())
        }
    }
}

fn require_role(session: &Session, required: ParticipantKind) -> Result<(), SessionError> {
    if session.kind() == Some(required) {
        Ok(())
    } else {
        Err(SessionError::WrongRole { required })
    }
}

/// Encode and send an event as a JSON text frame.
///
/// A send error means the connection is already tearing down; delivery
/// is best-effort and the failure is ignored.
pub fn send_event(tx: &ConnectionSender, event: &ServerEvent) {
    match serde_json::to_string(event) {
        Ok(text) => {
            let _ = tx.send(Message::Text(text.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode outbound event");
        }
    }
}

/// Send an `error {message}` event.
pub fn send_error(tx: &ConnectionSender, message: &str) {
    send_event(
        tx,
        &ServerEvent::Error {
            message: message.to_string(),
        },
    );
}
