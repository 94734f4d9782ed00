//! Fetch state of an `ObjectReadSeeker`.

use crate::api::{ObjectBody, ObjectStat};
use std::io;

/// Where the stream is relative to the remote fetch.
///
/// A body only exists in `Fetching`, and every seek replaces the state with
/// `Idle`, so a body whose start no longer matches the offset cannot be held.
pub(super) enum FetchState {
    /// No body held; the next read fetches from the current offset.
    Idle,
    /// Body of a fetch issued at `started_at`. Bytes delivered since then
    /// equal `offset - started_at`.
    Fetching { body: ObjectBody, started_at: u64 },
    /// The last fetch reached end of object and was closed.
    Exhausted,
}

impl FetchState {
    pub(super) fn name(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Fetching { .. } => "fetching",
            FetchState::Exhausted => "exhausted",
        }
    }
}

/// Mutable part of the stream, guarded by its mutex.
pub(super) struct Cursor {
    pub offset: u64,
    pub state: FetchState,
    pub stat: Option<ObjectStat>,
}

impl Cursor {
    pub(super) fn new() -> Self {
        Self {
            offset: 0,
            state: FetchState::Idle,
            stat: None,
        }
    }
}

/// Read whatever is left so the transport can reuse the connection, then close.
/// Drain errors are ignored; the body is closed either way.
pub(super) fn drain_and_close(mut body: ObjectBody) {
    let _ = io::copy(&mut body, &mut io::sink());
    drop(body);
}
