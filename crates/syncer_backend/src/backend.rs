//! Backend trait definitions.

use crate::error::BackendResult;
use std::sync::Arc;
use syncer_protocol::Message;

/// Function answering a request with a reply.
///
/// Backends may call it concurrently from any number of threads.
pub type RequestHandler = Arc<dyn Fn(&Message) -> Message + Send + Sync>;

/// The publishing half of a backend.
///
/// # Invariants
///
/// - Messages published through one publisher reach each subscriber in
///   publish order
/// - `publish` never waits for subscribers to acknowledge
pub trait Publisher: Send + Sync {
    /// Broadcasts a message to every current subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot accept the message.
    fn publish(&self, message: Message) -> BackendResult<()>;
}

/// A request/reply plus publish/subscribe transport.
///
/// Implementors are marker types; all state lives in the endpoints they
/// create. The sync server takes the backend as a type parameter and never
/// assumes a concrete transport.
pub trait Backend {
    /// Backend-specific endpoint configuration (address, hub, ...).
    type Config: Clone + Send + Sync;

    /// A running reply endpoint. Dropping it stops answering requests.
    type Replier: Send + Sync;

    /// A running publish endpoint.
    type Publisher: Publisher;

    /// Starts a reply endpoint answering every request with `handler`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be bound.
    fn replier(config: &Self::Config, handler: RequestHandler) -> BackendResult<Self::Replier>;

    /// Starts a publish endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be bound.
    fn publisher(config: &Self::Config) -> BackendResult<Self::Publisher>;
}
