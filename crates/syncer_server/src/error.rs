//! Error types for the sync server.

use syncer_backend::BackendError;
use syncer_protocol::ProtocolError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
///
/// An update that changes nothing is not an error.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The domain value could not be serialized.
    #[error("failed to serialize data: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The domain value serialized to something other than an object.
    #[error("data must serialize to a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A protocol payload could not be built.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The backend failed to bind or publish.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl ServerError {
    /// Returns true if the error comes from the domain value itself.
    pub fn is_data_error(&self) -> bool {
        matches!(self, ServerError::Serialize(_) | ServerError::NotAnObject(_))
    }
}
