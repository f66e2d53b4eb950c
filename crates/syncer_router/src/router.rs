//! Patch operation router.

use crate::error::{CallbackResult, RouterError, RouterResult};
use json_patch::{Patch, PatchOperation};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use syncer_protocol::{PatchOp, PatchOpSet};
use tracing::{debug, warn};

/// Uniform handler every typed callback is wrapped into.
type Handler<D> =
    Box<dyn Fn(&D, &Captures<'_>, PatchOp, &Value) -> CallbackResult + Send + Sync>;

/// A registered route.
struct PatchOpRoute<D: ?Sized> {
    /// Pattern as given at registration.
    source: String,
    /// Anchored form of `source`.
    pattern: Regex,
    ops: PatchOpSet,
    handler: Handler<D>,
}

/// Dispatches JSON Patch operations to the callbacks registered for them.
///
/// `D` is the data context handed to every callback, typically the
/// subscriber's local copy of the state or the application object reacting to
/// it.
///
/// # Invariants
///
/// - Routes are never removed or reordered once registered
/// - Every route whose operation set and path pattern match fires, in
///   registration order
/// - A value that cannot be decoded for one route never prevents other routes
///   from running
///
/// Registration takes `&mut self` and dispatch takes `&self`, so a router
/// shared across threads is read-only while dispatching.
pub struct PatchOpRouter<D: ?Sized> {
    routes: Vec<PatchOpRoute<D>>,
}

impl<D: ?Sized> PatchOpRouter<D> {
    /// Creates a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a callback for operations matching `path_pattern` and `ops`.
    ///
    /// For add and replace operations the value is decoded into `V` before the
    /// callback runs; if decoding fails the failure is logged and this
    /// callback is skipped for that operation. For remove operations the
    /// callback receives `V::default()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression or if
    /// `ops` is empty.
    pub fn add_callback<V, F>(
        &mut self,
        path_pattern: &str,
        ops: impl Into<PatchOpSet>,
        callback: F,
    ) -> RouterResult<()>
    where
        V: DeserializeOwned + Default + 'static,
        F: Fn(&D, &Captures<'_>, PatchOp, V) -> CallbackResult + Send + Sync + 'static,
    {
        let ops = ops.into();
        if ops.is_empty() {
            return Err(RouterError::EmptyOpSet(path_pattern.to_owned()));
        }

        let pattern = Regex::new(&format!("^(?:{path_pattern})$")).map_err(|source| {
            RouterError::InvalidPattern {
                pattern: path_pattern.to_owned(),
                source,
            }
        })?;

        let source = path_pattern.to_owned();
        let route_pattern = source.clone();
        let handler: Handler<D> = Box::new(move |data, captures, op, value| {
            let typed = if op == PatchOp::Remove {
                V::default()
            } else {
                match V::deserialize(value) {
                    Ok(typed) => typed,
                    Err(e) => {
                        warn!(
                            pattern = %route_pattern,
                            path = captures.get(0).map_or("", |m| m.as_str()),
                            %op,
                            error = %e,
                            "failed to decode patch operation value"
                        );
                        return Ok(());
                    }
                }
            };
            callback(data, captures, op, typed)
        });

        self.routes.push(PatchOpRoute {
            source,
            pattern,
            ops,
            handler,
        });
        Ok(())
    }

    /// Handles a single patch operation.
    ///
    /// Calls every callback whose operation set contains `op` and whose
    /// pattern matches the whole of `path`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a callback. Callbacks registered
    /// after the failing one are not run.
    pub fn handle_op(&self, data: &D, path: &str, op: PatchOp, value: &Value) -> RouterResult<()> {
        for route in &self.routes {
            if !route.ops.contains(op) {
                continue;
            }
            let Some(captures) = route.pattern.captures(path) else {
                continue;
            };
            (route.handler)(data, &captures, op, value).map_err(|source| {
                RouterError::Callback {
                    path: path.to_owned(),
                    op,
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Handles every operation of a decoded patch, in order.
    ///
    /// Move, copy and test operations are not routable and are skipped.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first callback error.
    pub fn dispatch(&self, data: &D, patch: &Patch) -> RouterResult<()> {
        for operation in &patch.0 {
            match operation {
                PatchOperation::Add(add) => {
                    self.handle_op(data, add.path.as_str(), PatchOp::Add, &add.value)?
                }
                PatchOperation::Remove(remove) => {
                    self.handle_op(data, remove.path.as_str(), PatchOp::Remove, &Value::Null)?
                }
                PatchOperation::Replace(replace) => self.handle_op(
                    data,
                    replace.path.as_str(),
                    PatchOp::Replace,
                    &replace.value,
                )?,
                other => debug!(?other, "skipping non-routable patch operation"),
            }
        }
        Ok(())
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the registered patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.source.as_str())
    }
}

impl<D: ?Sized> Default for PatchOpRouter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ?Sized> fmt::Debug for PatchOpRouter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (&r.source, r.ops.bits())))
            .finish()
    }
}
