//! Error types for backend operations.

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur in a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A replier is already bound to the endpoint.
    #[error("endpoint already in use: {0}")]
    AddressInUse(String),

    /// No replier is bound to the endpoint.
    #[error("no replier bound to endpoint: {0}")]
    NoReplier(String),

    /// The other side of a channel is gone.
    #[error("endpoint disconnected: {0}")]
    Disconnected(String),

    /// No message arrived in time.
    #[error("timed out waiting on endpoint: {0}")]
    Timeout(String),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            BackendError::AddressInUse("state".into()).to_string(),
            "endpoint already in use: state"
        );
        assert_eq!(
            BackendError::NoReplier("snap".into()).to_string(),
            "no replier bound to endpoint: snap"
        );
    }
}
