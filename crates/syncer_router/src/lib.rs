//! # Syncer Router
//!
//! Dispatches individual JSON Patch operations to typed, path-scoped
//! callbacks.
//!
//! A subscriber applies each published patch to its local copy of the state
//! and then feeds every operation through a [`PatchOpRouter`] so the
//! application can react to the parts of the state it cares about.
//!
//! ## Matching
//!
//! - Path patterns are regular expressions matched against the **whole**
//!   operation path (`/a` never matches `/ab` or `/a/b`)
//! - Capture groups are handed to the callback
//! - Every matching route fires, in registration order
//!
//! ## Example
//!
//! ```rust
//! use syncer_protocol::{PatchOp, PatchOpSet};
//! use syncer_router::PatchOpRouter;
//! use serde_json::json;
//! use std::sync::Mutex;
//!
//! let mut router: PatchOpRouter<Mutex<Vec<String>>> = PatchOpRouter::new();
//! router
//!     .add_callback("/users/(\\d+)/name", PatchOpSet::ANY, |log, caps, op, name: String| {
//!         log.lock().unwrap().push(format!("{op} user {} = {name}", &caps[1]));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let log = Mutex::new(Vec::new());
//! router
//!     .handle_op(&log, "/users/7/name", PatchOp::Replace, &json!("ada"))
//!     .unwrap();
//! assert_eq!(log.lock().unwrap()[0], "replace user 7 = ada");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod router;

pub use error::{CallbackError, CallbackResult, RouterError, RouterResult};
pub use regex::Captures;
pub use router::PatchOpRouter;
