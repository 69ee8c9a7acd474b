//! Directed signaling relay between a viewer and a camera.
//!
//! Offers travel viewer → camera, answers camera → viewer, and ICE
//! candidates follow the sender's role in either direction. The relay
//! rewrites the envelope to carry `from` instead of `to` and forwards
//! the payload without interpreting it; it never mutates the registry.

use crate::registry::{ParticipantKind, Registry};
use crate::ws::protocol::{
    send_error, send_event, ForwardedIce, ForwardedSignal, IcePayload, ServerEvent, SignalPayload,
};
use crate::ws::ConnectionSender;

/// Relay a viewer's SDP offer to the camera named in `to`.
pub fn relay_offer(registry: &Registry, signal: SignalPayload, sender_tx: &ConnectionSender) {
    match registry.find_by_id(ParticipantKind::Camera, &signal.to) {
        Some(target) => {
            send_event(
                &target,
                &ServerEvent::Offer(ForwardedSignal {
                    from: signal.id,
                    sdp_type: signal.sdp_type,
                    sdp: signal.sdp,
                }),
            );
        }
        None => miss(sender_tx, ParticipantKind::Camera, &signal.to, "offer"),
    }
}

/// Relay a camera's SDP answer to the viewer named in `to`.
pub fn relay_answer(registry: &Registry, signal: SignalPayload, sender_tx: &ConnectionSender) {
    match registry.find_by_id(ParticipantKind::Viewer, &signal.to) {
        Some(target) => {
            send_event(
                &target,
                &ServerEvent::Answer(ForwardedSignal {
                    from: signal.id,
                    sdp_type: signal.sdp_type,
                    sdp: signal.sdp,
                }),
            );
        }
        None => miss(sender_tx, ParticipantKind::Viewer, &signal.to, "answer"),
    }
}

/// Relay an ICE candidate to the opposite partition. Pure pass-through:
/// the candidate fields are forwarded untouched.
pub fn relay_ice(
    registry: &Registry,
    sender_kind: ParticipantKind,
    ice: IcePayload,
    sender_tx: &ConnectionSender,
) {
    let target_kind = sender_kind.opposite();
    match registry.find_by_id(target_kind, &ice.to) {
        Some(target) => {
            send_event(
                &target,
                &ServerEvent::IceCandidate(ForwardedIce {
                    from: ice.id,
                    candidate: ice.candidate,
                }),
            );
        }
        None => miss(sender_tx, target_kind, &ice.to, "ice-candidate"),
    }
}

/// Routing miss: answer the sender only; the connection stays open and
/// no one else is affected.
fn miss(sender_tx: &ConnectionSender, target_kind: ParticipantKind, to: &str, kind: &str) {
    tracing::debug!(to = %to, kind = kind, "relay target not connected");
    let message = match target_kind {
        ParticipantKind::Camera => "Camera not found",
        ParticipantKind::Viewer => "Viewer not found",
    };
    send_error(sender_tx, message);
}
