//! Error types for protocol decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding protocol payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A non-empty published message is not a JSON Patch document.
    #[error("malformed patch message: {0}")]
    MalformedPatch(#[source] serde_json::Error),

    /// A patch document could not be encoded.
    #[error("failed to encode patch: {0}")]
    Encode(#[source] serde_json::Error),

    /// A reply payload is not a JSON document.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(#[source] serde_json::Error),

    /// A snapshot does not carry the reserved version field.
    #[error("snapshot has no integer `{0}` field")]
    MissingVersion(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::MissingVersion("__v");
        assert_eq!(err.to_string(), "snapshot has no integer `__v` field");

        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err = ProtocolError::MalformedPatch(json_err);
        assert!(err.to_string().starts_with("malformed patch message"));
    }
}
