//! # Syncer Protocol
//!
//! Wire-level types shared by the sync server and its subscribers.
//!
//! This crate provides:
//! - [`Message`], the opaque text payload carried by every backend
//! - [`PatchMessage`], the decoded form of a published message
//! - [`PatchOp`] and [`PatchOpSet`] for routing individual operations
//! - [`VERSION_KEY`], the reserved top-level field holding the state version
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Messages
//!
//! A publisher emits two kinds of payloads:
//! - an **empty** message, the bootstrap signal: subscribers must drop any
//!   assumption of patch continuity and request a full snapshot
//! - a **JSON Patch** document (RFC 6902) moving the state one version forward
//!
//! A replier always answers with the full serialized state, version included.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod message;
mod op;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{read_version, Message, PatchMessage, VERSION_KEY};
pub use op::{PatchOp, PatchOpSet};
