//! In-memory connection registry.
//!
//! Tracks every identified participant, partitioned into viewers and
//! cameras, keyed by an opaque connection id. Entirely transient: the
//! registry lives and dies with the process and is rebuilt from live
//! connections alone.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::ws::ConnectionSender;

/// Opaque handle for one open WebSocket connection.
///
/// Allocated from a process-wide counter; never reused within a process
/// lifetime. The underlying socket is owned by its connection actor —
/// the registry only ever holds this id and the connection's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocate the next unused connection id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two participant populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    Viewer,
    Camera,
}

impl ParticipantKind {
    pub fn opposite(self) -> Self {
        match self {
            Self::Viewer => Self::Camera,
            Self::Camera => Self::Viewer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Camera => "camera",
        }
    }
}

/// Public fields of a connected viewer. The id is supplied by the
/// client at join time, not generated here.
#[derive(Debug, Clone)]
pub struct ViewerInfo {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

/// Public fields of a connected camera device.
#[derive(Debug, Clone, Serialize)]
pub struct CameraInfo {
    pub id: String,
    pub name: String,
    pub location: String,
}

/// Participant record, one per identified connection.
#[derive(Debug, Clone)]
pub enum Participant {
    Viewer(ViewerInfo),
    Camera(CameraInfo),
}

impl Participant {
    pub fn kind(&self) -> ParticipantKind {
        match self {
            Self::Viewer(_) => ParticipantKind::Viewer,
            Self::Camera(_) => ParticipantKind::Camera,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Viewer(v) => &v.id,
            Self::Camera(c) => &c.id,
        }
    }
}

struct Entry<T> {
    info: T,
    sender: ConnectionSender,
}

#[derive(Default)]
struct Partitions {
    viewers: HashMap<ConnectionId, Entry<ViewerInfo>>,
    cameras: HashMap<ConnectionId, Entry<CameraInfo>>,
}

/// Registry of live participants, shared across all connection actors.
///
/// One mutex guards both partitions so that mutations and
/// snapshot-requiring reads serialize against each other. Callers must
/// not hold the lock across socket sends — the snapshot methods copy
/// what they need and release it (sends are channel pushes handled by
/// each connection's writer task, so nothing here blocks on I/O).
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<Partitions>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `handle`.
    ///
    /// Idempotent under repeated calls with the same handle. A handle
    /// re-identifying under the other role is moved between partitions,
    /// so it is present in at most one of them at any time. Duplicate
    /// participant ids across different handles are deliberately not
    /// rejected (see `find_by_id`).
    pub fn register(&self, handle: ConnectionId, record: Participant, sender: ConnectionSender) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.viewers.remove(&handle);
        inner.cameras.remove(&handle);
        match record {
            Participant::Viewer(info) => {
                inner.viewers.insert(handle, Entry { info, sender });
            }
            Participant::Camera(info) => {
                inner.cameras.insert(handle, Entry { info, sender });
            }
        }
    }

    /// Remove and return the record for `handle`, if it was registered.
    pub fn unregister(&self, handle: ConnectionId) -> Option<Participant> {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(entry) = inner.viewers.remove(&handle) {
            return Some(Participant::Viewer(entry.info));
        }
        inner
            .cameras
            .remove(&handle)
            .map(|entry| Participant::Camera(entry.info))
    }

    /// Find a participant's mailbox by id within one partition.
    ///
    /// Linear scan; when several connections claim the same id the
    /// first match in iteration order wins and the tie-break is
    /// undefined.
    pub fn find_by_id(&self, kind: ParticipantKind, id: &str) -> Option<ConnectionSender> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        match kind {
            ParticipantKind::Viewer => inner
                .viewers
                .values()
                .find(|entry| entry.info.id == id)
                .map(|entry| entry.sender.clone()),
            ParticipantKind::Camera => inner
                .cameras
                .values()
                .find(|entry| entry.info.id == id)
                .map(|entry| entry.sender.clone()),
        }
    }

    /// Snapshot of all connected viewers at call time.
    pub fn list_viewers(&self) -> Vec<ViewerInfo> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.viewers.values().map(|e| e.info.clone()).collect()
    }

    /// Snapshot of all connected cameras at call time.
    pub fn list_cameras(&self) -> Vec<CameraInfo> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.cameras.values().map(|e| e.info.clone()).collect()
    }

    /// Snapshot of one partition's mailboxes, for broadcast fan-out.
    pub fn snapshot_senders(&self, kind: ParticipantKind) -> Vec<ConnectionSender> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        match kind {
            ParticipantKind::Viewer => {
                inner.viewers.values().map(|e| e.sender.clone()).collect()
            }
            ParticipantKind::Camera => {
                inner.cameras.values().map(|e| e.sender.clone()).collect()
            }
        }
    }

    /// Current participant counts: (viewers, cameras).
    pub fn counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().expect("registry lock poisoned");
        (inner.viewers.len(), inner.cameras.len())
    }
}
