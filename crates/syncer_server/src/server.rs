//! Main sync server.

use crate::error::{ServerError, ServerResult};
use crate::stats::{Counters, ServerStats};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use syncer_backend::{Backend, InMemoryBackend, Publisher, RequestHandler};
use syncer_protocol::{Message, VERSION_KEY};
use tracing::debug;

/// State shared between the server and its reply handler.
///
/// The snapshot mutex is the only lock a server owns.
#[derive(Debug)]
struct Shared {
    snapshot: Mutex<Message>,
    counters: Counters,
}

impl Shared {
    fn reply(&self) -> Message {
        let reply = self.snapshot.lock().clone();
        self.counters.record_reply();
        reply
    }
}

/// The sync server.
///
/// Owns the canonical state of a domain value `T`, its version and a cached
/// serialized snapshot. Starts a replier and a publisher of backend `B` at
/// construction.
///
/// # Invariants
///
/// - The version starts at 0 and grows by exactly 1 per committed update
/// - The version stored in the state always equals [`version`](Self::version)
/// - The cached snapshot is always the serialization of the committed state
/// - Exactly one bootstrap (empty) message is published, at construction
///
/// # Concurrency
///
/// [`update`](Self::update) takes `&mut self`: there is a single writer. The
/// reply handler only ever reads the cached snapshot under its lock, so the
/// backend may answer requests from any number of threads while an update is
/// in flight.
pub struct SyncServer<T, B: Backend = InMemoryBackend> {
    /// Kept alive so requests keep being answered.
    _replier: B::Replier,
    publisher: B::Publisher,
    state: Value,
    version: u64,
    shared: Arc<Shared>,
    _data: PhantomData<fn(&T)>,
}

impl<T: Serialize, B: Backend> SyncServer<T, B> {
    /// Creates a server holding `data` at version 0.
    ///
    /// Starts the reply endpoint on `rep_config` and the publish endpoint on
    /// `pub_config`, then publishes the bootstrap signal so that subscribers
    /// from a previous session fetch a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not serialize to a JSON object or if
    /// the backend cannot start its endpoints or publish.
    pub fn new(rep_config: &B::Config, pub_config: &B::Config, data: &T) -> ServerResult<Self> {
        let state = versioned(data, 0)?;
        let shared = Arc::new(Shared {
            snapshot: Mutex::new(Message::new(state.to_string())),
            counters: Counters::default(),
        });

        let replier = B::replier(rep_config, reply_handler(&shared))?;
        let publisher = B::publisher(pub_config)?;

        // An empty message asks subscribers to request a full state.
        publisher.publish(Message::bootstrap())?;
        debug!("sync server started, bootstrap published");

        Ok(Self {
            _replier: replier,
            publisher,
            state,
            version: 0,
            shared,
            _data: PhantomData,
        })
    }

    /// Replaces the state with `data`.
    ///
    /// If anything besides the version changed, the new state is committed
    /// at the next version, the snapshot is rebuilt and the diff from the
    /// previous state is published. Otherwise nothing happens.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be serialized (nothing is committed)
    /// or if publishing fails (the update stays committed).
    pub fn update(&mut self, data: &T) -> ServerResult<()> {
        let next_version = self.version + 1;
        let next = versioned(data, next_version)?;

        // The version field always differs, so a single operation means
        // nothing else did.
        let diff = json_patch::diff(&self.state, &next);
        if diff.0.len() <= 1 {
            self.shared.counters.record_skip();
            debug!(version = self.version, "update changed nothing, skipped");
            return Ok(());
        }
        let message = Message::from_patch(&diff)?;

        self.state = next;
        self.version = next_version;
        let snapshot = Message::new(self.state.to_string());
        *self.shared.snapshot.lock() = snapshot;
        self.shared.counters.record_commit();
        debug!(
            version = self.version,
            ops = diff.0.len(),
            bytes = message.len(),
            "update committed"
        );

        self.publisher.publish(message)?;
        Ok(())
    }
}

impl<T, B: Backend> SyncServer<T, B> {
    /// Answers a snapshot request.
    ///
    /// The request content is ignored; the reply is always the latest
    /// committed state.
    pub fn handle_request(&self, _request: &Message) -> Message {
        self.shared.reply()
    }

    /// Returns a handler answering requests the way the replier does.
    pub fn request_handler(&self) -> RequestHandler {
        reply_handler(&self.shared)
    }

    /// Returns the committed version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the committed state, version field included.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Returns the cached snapshot.
    pub fn snapshot(&self) -> Message {
        self.shared.snapshot.lock().clone()
    }

    /// Returns the server counters.
    pub fn stats(&self) -> ServerStats {
        self.shared.counters.snapshot()
    }
}

impl<T, B: Backend> fmt::Debug for SyncServer<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncServer")
            .field("version", &self.version)
            .field("snapshot_len", &self.shared.snapshot.lock().len())
            .finish_non_exhaustive()
    }
}

fn reply_handler(shared: &Arc<Shared>) -> RequestHandler {
    let shared = Arc::clone(shared);
    Arc::new(move |_request: &Message| shared.reply())
}

/// Serializes `data` and stamps it with `version`.
///
/// `null` becomes an empty object so unit-like values still carry a version.
fn versioned<T: Serialize>(data: &T, version: u64) -> ServerResult<Value> {
    let mut object = match serde_json::to_value(data).map_err(ServerError::Serialize)? {
        Value::Object(object) => object,
        Value::Null => Map::new(),
        Value::Bool(_) => return Err(ServerError::NotAnObject("boolean")),
        Value::Number(_) => return Err(ServerError::NotAnObject("number")),
        Value::String(_) => return Err(ServerError::NotAnObject("string")),
        Value::Array(_) => return Err(ServerError::NotAnObject("array")),
    };
    object.insert(VERSION_KEY.to_owned(), Value::from(version));
    Ok(Value::Object(object))
}
