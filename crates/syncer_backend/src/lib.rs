//! # Syncer Backend
//!
//! Transport abstraction consumed by the sync server.
//!
//! A backend provides two roles:
//! - a **replier** answering every request with a message produced by a
//!   [`RequestHandler`]
//! - a **publisher** broadcasting messages to every current subscriber
//!
//! ## Design Principles
//!
//! - Backends move opaque [`Message`](syncer_protocol::Message)s; they never
//!   interpret payloads
//! - Messages from one publisher are delivered in publish order
//! - Delivery guarantees and backpressure belong to the backend, not to the
//!   server
//! - The server is generic over [`Backend`] at compile time
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - In-process hub for tests and single-process use
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use syncer_backend::{Backend, InMemoryBackend, InMemoryConfig, InMemoryHub, Publisher};
//! use syncer_protocol::Message;
//!
//! let hub = Arc::new(InMemoryHub::new());
//! let config = InMemoryConfig::new(Arc::clone(&hub), "state");
//!
//! let subscription = hub.subscribe("state");
//! let publisher = InMemoryBackend::publisher(&config).unwrap();
//! publisher.publish(Message::from("hello")).unwrap();
//! assert_eq!(subscription.try_recv().unwrap().as_str(), "hello");
//!
//! let _replier = InMemoryBackend::replier(&config, Arc::new(|_req: &Message| Message::from("pong"))).unwrap();
//! assert_eq!(hub.request("state", &Message::from("ping")).unwrap().as_str(), "pong");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod error;
mod memory;

pub use backend::{Backend, Publisher, RequestHandler};
pub use error::{BackendError, BackendResult};
pub use memory::{
    InMemoryBackend, InMemoryConfig, InMemoryHub, InMemoryPublisher, InMemoryReplier,
    Subscription,
};
