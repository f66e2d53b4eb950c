//! Error types for the patch operation router.

use syncer_protocol::PatchOp;
use thiserror::Error;

/// Error type returned by user callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by user callbacks.
pub type CallbackResult = Result<(), CallbackError>;

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors that can occur while registering or dispatching routes.
#[derive(Error, Debug)]
pub enum RouterError {
    /// The path pattern is not a valid regular expression.
    #[error("invalid path pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The route would never fire.
    #[error("empty operation set for path pattern {0:?}")]
    EmptyOpSet(String),

    /// A user callback failed.
    #[error("callback for {op} {path} failed: {source}")]
    Callback {
        /// Path of the operation being dispatched.
        path: String,
        /// Kind of the operation being dispatched.
        op: PatchOp,
        /// Error returned by the callback.
        #[source]
        source: CallbackError,
    },
}
