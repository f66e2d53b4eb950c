//! CLI command implementations.

pub mod diff;
pub mod replay;

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use syncer_backend::{InMemoryConfig, InMemoryHub, Subscription};
use syncer_server::SyncServer;

/// Endpoint the local server answers snapshot requests on.
pub const REPLY_ENDPOINT: &str = "snapshot";

/// Topic the local server publishes patches on.
pub const PUBLISH_TOPIC: &str = "patches";

/// A server on a private hub, plus a subscription to what it publishes.
pub struct LocalSession {
    /// Hub shared by the server and the subscriber.
    pub hub: Arc<InMemoryHub>,
    /// The server.
    pub server: SyncServer<Value>,
    /// Everything the server publishes.
    pub published: Subscription,
}

impl LocalSession {
    /// Starts a server holding `initial`.
    pub fn start(initial: &Value) -> Result<Self, Box<dyn std::error::Error>> {
        let hub = Arc::new(InMemoryHub::new());
        let published = hub.subscribe(PUBLISH_TOPIC);
        let server = SyncServer::new(
            &InMemoryConfig::new(Arc::clone(&hub), REPLY_ENDPOINT),
            &InMemoryConfig::new(Arc::clone(&hub), PUBLISH_TOPIC),
            initial,
        )?;
        Ok(Self {
            hub,
            server,
            published,
        })
    }
}

/// Reads a JSON document from a file.
pub fn read_document(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in {:?}: {}", path, e).into())
}
