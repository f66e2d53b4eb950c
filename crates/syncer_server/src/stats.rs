//! Server counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about a running server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Updates that were committed and published.
    pub committed: u64,
    /// Updates discarded because nothing but the version changed.
    pub skipped: u64,
    /// Snapshot requests answered.
    pub replies: u64,
}

/// Lock-free counters shared with the reply handler.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    committed: AtomicU64,
    skipped: AtomicU64,
    replies: AtomicU64,
}

impl Counters {
    pub(crate) fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reply(&self) {
        self.replies.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ServerStats {
        ServerStats {
            committed: self.committed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
        }
    }
}
