//! # Syncer Server
//!
//! Keeps one authoritative, versioned JSON state in sync with any number of
//! remote observers.
//!
//! This crate provides:
//! - [`SyncServer`], owning the canonical state and its version
//! - Diff publication over a [`Backend`](syncer_backend::Backend) publisher
//! - Full snapshots served from a cache over the backend replier
//!
//! # Protocol
//!
//! 1. On construction the server publishes one empty message (bootstrap)
//! 2. Every subscriber answers a bootstrap by requesting a full snapshot
//! 3. Each committed update publishes a JSON Patch from version `N` to `N + 1`
//! 4. Any request, whatever its content, is answered with the latest snapshot
//!
//! The version lives in the state itself under
//! [`VERSION_KEY`](syncer_protocol::VERSION_KEY), so every patch touches it and
//! every snapshot carries it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use syncer_backend::{InMemoryConfig, InMemoryHub};
//! use syncer_server::SyncServer;
//!
//! let hub = Arc::new(InMemoryHub::new());
//! let rep = InMemoryConfig::new(Arc::clone(&hub), "snapshot");
//! let publ = InMemoryConfig::new(Arc::clone(&hub), "patches");
//!
//! let updates = hub.subscribe("patches");
//! let mut server: SyncServer<serde_json::Value> =
//!     SyncServer::new(&rep, &publ, &json!({"count": 0})).unwrap();
//! assert!(updates.try_recv().unwrap().is_bootstrap());
//!
//! server.update(&json!({"count": 1})).unwrap();
//! assert_eq!(server.version(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod server;
mod stats;

pub use error::{ServerError, ServerResult};
pub use server::SyncServer;
pub use stats::ServerStats;
