//! Test fixtures.
//!
//! Wires a [`SyncServer`] to a fresh in-memory hub so tests only deal with
//! domain values and published messages.

use crate::mirror::Mirror;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use syncer_backend::{InMemoryConfig, InMemoryHub, Subscription};
use syncer_protocol::Message;
use syncer_server::SyncServer;

/// Endpoint the test server answers snapshot requests on.
pub const REPLY_ENDPOINT: &str = "snapshot";

/// Topic the test server publishes patches on.
pub const PUBLISH_TOPIC: &str = "patches";

/// A sync server on its own hub, with a subscription recording everything it
/// publishes.
pub struct TestServer<T: Serialize = Value> {
    hub: Arc<InMemoryHub>,
    server: SyncServer<T>,
    published: Subscription,
}

impl<T: Serialize> TestServer<T> {
    /// Starts a server holding `data` on a new hub.
    pub fn start(data: &T) -> Self {
        Self::start_on(Arc::new(InMemoryHub::new()), data)
    }

    /// Starts a server holding `data` on an existing hub.
    pub fn start_on(hub: Arc<InMemoryHub>, data: &T) -> Self {
        let published = hub.subscribe(PUBLISH_TOPIC);
        let server = SyncServer::new(
            &InMemoryConfig::new(Arc::clone(&hub), REPLY_ENDPOINT),
            &InMemoryConfig::new(Arc::clone(&hub), PUBLISH_TOPIC),
            data,
        )
        .expect("Failed to start sync server");
        Self {
            hub,
            server,
            published,
        }
    }

    /// Stops this server and starts a new one holding `data` on the same hub.
    pub fn restart(self, data: &T) -> Self {
        let TestServer { hub, server, .. } = self;
        drop(server);
        Self::start_on(hub, data)
    }

    /// Updates the server state.
    pub fn update(&mut self, data: &T) {
        self.server.update(data).expect("Failed to update sync server");
    }

    /// Connects a new mirror to this server.
    pub fn mirror(&self) -> Mirror {
        Mirror::connect(Arc::clone(&self.hub), REPLY_ENDPOINT, PUBLISH_TOPIC)
    }

    /// Requests a snapshot over the hub.
    pub fn request(&self) -> Message {
        self.hub
            .request(REPLY_ENDPOINT, &Message::bootstrap())
            .expect("Failed to request snapshot")
    }

    /// Takes every message published since the last call.
    pub fn published(&self) -> Vec<Message> {
        self.published.drain()
    }

    /// Returns the committed state.
    pub fn state(&self) -> &Value {
        self.server.state()
    }

    /// Returns the committed version.
    pub fn version(&self) -> u64 {
        self.server.version()
    }

    /// Returns the hub.
    pub fn hub(&self) -> &Arc<InMemoryHub> {
        &self.hub
    }
}

impl<T: Serialize> std::ops::Deref for TestServer<T> {
    type Target = SyncServer<T>;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixture_starts_with_bootstrap() {
        let server = TestServer::start(&json!({"a": 1}));
        assert_eq!(server.published(), vec![Message::bootstrap()]);
        assert_eq!(server.version(), 0);
    }

    #[test]
    fn restart_resets_version_and_bootstraps_again() {
        let mut server = TestServer::start(&json!({"a": 1}));
        server.update(&json!({"a": 2}));
        assert_eq!(server.version(), 1);

        let server = server.restart(&json!({"a": 3}));
        assert_eq!(server.version(), 0);
        assert_eq!(server.published(), vec![Message::bootstrap()]);
        let (state, version) = server.request().decode_snapshot().unwrap();
        assert_eq!(version, 0);
        assert_eq!(state["a"], json!(3));
    }
}
