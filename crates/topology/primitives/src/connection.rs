//! Opaque switch connection handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to the control channel of a connected switch.
///
/// The topology engine only needs identity and liveness; the transport that owns the real
/// connection keeps a clone and calls [`close`](Self::close) when the channel goes away.
/// Clones share the liveness flag.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: u64,
    alive: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Allocates a handle with a process-unique id.
    pub fn new() -> Self {
        Self::with_id(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn with_id(id: u64) -> Self {
        Self {
            id,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
