//! # Syncer Testkit
//!
//! Test utilities for syncer.
//!
//! This crate provides:
//! - [`Mirror`], a reference subscriber keeping a local copy of the state
//! - Test fixtures wiring a server to an in-memory hub
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use syncer_router::PatchOpRouter;
//! use syncer_testkit::TestServer;
//!
//! let mut server = TestServer::start(&json!({"count": 0}));
//! let mut mirror = server.mirror();
//! let router = PatchOpRouter::new();
//!
//! server.update(&json!({"count": 1}));
//! mirror.poll(&router).unwrap();
//! assert_eq!(mirror.state(), Some(server.state()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mirror;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::mirror::*;
}

pub use fixtures::*;
pub use generators::*;
pub use mirror::*;
