//! Reference subscriber.
//!
//! A [`Mirror`] keeps a local copy of the server state the way a client
//! would: it applies published patches in order, reconciles by version, and
//! falls back to a full snapshot whenever continuity is lost.

use json_patch::{Patch, PatchOperation};
use serde_json::Value;
use std::sync::Arc;
use syncer_backend::{BackendError, InMemoryHub, Subscription};
use syncer_protocol::{
    read_version, Message, PatchMessage, PatchOp, ProtocolError, VERSION_KEY,
};
use syncer_router::{PatchOpRouter, RouterError};
use thiserror::Error;
use tracing::{debug, warn};

/// Result type for mirror operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors that can occur while mirroring.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Snapshot request failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A message or snapshot could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An application callback failed.
    #[error("router error: {0}")]
    Router(#[from] RouterError),
}

/// Counters about a mirror's history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Patches applied to the local copy.
    pub applied: u64,
    /// Patches skipped because the local copy already included them.
    pub stale: u64,
    /// Full snapshots fetched.
    pub resyncs: u64,
}

/// A subscriber holding a local copy of the state.
///
/// Every applied patch is dispatched through the router given to
/// [`poll`](Self::poll) with the updated local copy as data context. After a
/// full snapshot is fetched the router sees a single replace at the root path
/// (`""`) carrying the whole state.
#[derive(Debug)]
pub struct Mirror {
    hub: Arc<InMemoryHub>,
    reply_endpoint: String,
    updates: Subscription,
    state: Option<Value>,
    stats: MirrorStats,
}

impl Mirror {
    /// Subscribes to `publish_topic` and uses `reply_endpoint` for snapshots.
    ///
    /// The mirror starts empty; it fills on the first bootstrap or patch.
    pub fn connect(hub: Arc<InMemoryHub>, reply_endpoint: &str, publish_topic: &str) -> Self {
        let updates = hub.subscribe(publish_topic);
        Self {
            hub,
            reply_endpoint: reply_endpoint.to_owned(),
            updates,
            state: None,
            stats: MirrorStats::default(),
        }
    }

    /// Handles every message queued so far. Returns how many were handled.
    ///
    /// # Errors
    ///
    /// Stops at the first snapshot, decode or callback failure. Messages
    /// after the failing one stay queued.
    pub fn poll(&mut self, router: &PatchOpRouter<Value>) -> MirrorResult<usize> {
        let mut handled = 0;
        while let Some(message) = self.updates.try_recv() {
            self.handle(&message, router)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Handles one published message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be decoded, a snapshot cannot
    /// be fetched, or a callback fails.
    pub fn handle(&mut self, message: &Message, router: &PatchOpRouter<Value>) -> MirrorResult<()> {
        let patch = match message.decode_patch()? {
            PatchMessage::Bootstrap => {
                debug!("bootstrap received");
                return self.resync(router);
            }
            PatchMessage::Patch(patch) => patch,
        };

        let Some(current) = self.state.as_ref() else {
            return self.resync(router);
        };
        let current_version = read_version(current).unwrap_or(0);

        match patch_version(&patch) {
            // Already part of a snapshot fetched while the patch was in flight.
            Some(version) if version <= current_version => {
                self.stats.stale += 1;
                debug!(version, current_version, "stale patch skipped");
                return Ok(());
            }
            Some(version) if version == current_version + 1 => {}
            other => {
                warn!(?other, current_version, "patch does not follow local version");
                return self.resync(router);
            }
        }

        let mut next = current.clone();
        if let Err(e) = json_patch::patch(&mut next, &patch.0) {
            warn!(error = %e, "patch failed to apply, resyncing");
            return self.resync(router);
        }
        self.stats.applied += 1;
        let state = self.state.insert(next);
        router.dispatch(state, &patch)?;
        Ok(())
    }

    /// Replaces the local copy with a full snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the snapshot is malformed, or
    /// the root callback fails.
    pub fn resync(&mut self, router: &PatchOpRouter<Value>) -> MirrorResult<()> {
        let reply = self
            .hub
            .request(&self.reply_endpoint, &Message::bootstrap())?;
        let (snapshot, version) = reply.decode_snapshot()?;
        self.stats.resyncs += 1;
        debug!(version, "snapshot fetched");

        let state: &Value = self.state.insert(snapshot);
        router.handle_op(state, "", PatchOp::Replace, state)?;
        Ok(())
    }

    /// Returns the local copy, if any.
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Returns the version of the local copy, if any.
    pub fn version(&self) -> Option<u64> {
        self.state.as_ref().and_then(read_version)
    }

    /// Returns the mirror counters.
    pub fn stats(&self) -> MirrorStats {
        self.stats.clone()
    }
}

/// Returns the version a patch moves the state to.
fn patch_version(patch: &Patch) -> Option<u64> {
    patch.0.iter().find_map(|op| match op {
        PatchOperation::Replace(replace)
            if replace.path.as_str().strip_prefix('/') == Some(VERSION_KEY) =>
        {
            replace.value.as_u64()
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_of_patch() {
        let patch: Patch = serde_json::from_value(json!([
            {"op": "replace", "path": "/count", "value": 3},
            {"op": "replace", "path": format!("/{VERSION_KEY}"), "value": 9},
        ]))
        .unwrap();
        assert_eq!(patch_version(&patch), Some(9));

        let patch: Patch =
            serde_json::from_value(json!([{"op": "add", "path": "/x", "value": 1}])).unwrap();
        assert_eq!(patch_version(&patch), None);
    }

    #[test]
    fn resync_without_server_fails() {
        let hub = Arc::new(InMemoryHub::new());
        let mut mirror = Mirror::connect(hub, "snapshot", "patches");
        let router = PatchOpRouter::new();
        assert!(matches!(
            mirror.resync(&router),
            Err(MirrorError::Backend(BackendError::NoReplier(_)))
        ));
        assert!(mirror.state().is_none());
    }
}
