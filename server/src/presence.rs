//! Presence broadcast to the opposite participant population.
//!
//! Viewers are told about cameras and cameras about viewers; a
//! population is never notified about its own members. The recipient
//! set is the opposite partition as of the instant the event fires —
//! participants joining afterwards receive no backfill.

use crate::registry::{Participant, Registry};
use crate::ws::protocol::{send_event, ServerEvent};

/// Announce a newly joined participant to the opposite partition.
pub fn announce_join(registry: &Registry, joined: &Participant) {
    let event = match joined {
        Participant::Viewer(v) => ServerEvent::ViewerConnect { id: v.id.clone() },
        Participant::Camera(c) => ServerEvent::CameraConnect(c.clone()),
    };
    fan_out(registry, joined, &event);
}

/// Announce a departed participant to the opposite partition.
pub fn announce_leave(registry: &Registry, departed: &Participant) {
    let event = match departed {
        Participant::Viewer(v) => ServerEvent::ViewerDisconnect { id: v.id.clone() },
        Participant::Camera(c) => ServerEvent::CameraDisconnect { id: c.id.clone() },
    };
    fan_out(registry, departed, &event);
}

/// Snapshot the opposite partition's mailboxes, then send to each
/// independently. The registry lock is released before any send, and a
/// recipient whose channel has closed is simply skipped — one dead or
/// slow peer cannot affect delivery to the rest.
fn fan_out(registry: &Registry, subject: &Participant, event: &ServerEvent) {
    let recipients = registry.snapshot_senders(subject.kind().opposite());
    tracing::debug!(
        kind = subject.kind().as_str(),
        id = %subject.id(),
        recipients = recipients.len(),
        "broadcasting presence change"
    );
    for tx in &recipients {
        send_event(tx, event);
    }
}
