//! Published and replied payloads.

use crate::error::{ProtocolError, ProtocolResult};
use json_patch::Patch;
use serde_json::Value;
use std::fmt;

/// Reserved top-level field holding the state version.
///
/// Present in every snapshot and touched by every published patch. Domain
/// values must not use this key for their own data.
pub const VERSION_KEY: &str = "__syncer_data_version";

/// An opaque UTF-8 payload exchanged over a backend.
///
/// The empty message is the bootstrap signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message(String);

impl Message {
    /// Creates a message from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates the empty bootstrap message.
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::default()
    }

    /// Encodes a JSON Patch document as a message.
    pub fn from_patch(patch: &Patch) -> ProtocolResult<Self> {
        serde_json::to_string(patch)
            .map(Self)
            .map_err(ProtocolError::Encode)
    }

    /// Returns true if this is the bootstrap signal.
    pub fn is_bootstrap(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the message, returning the payload text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decodes a published message.
    pub fn decode_patch(&self) -> ProtocolResult<PatchMessage> {
        PatchMessage::decode(self)
    }

    /// Decodes a reply payload into the full state.
    ///
    /// Fails if the payload is not JSON or lacks the version field.
    pub fn decode_snapshot(&self) -> ProtocolResult<(Value, u64)> {
        let state: Value =
            serde_json::from_str(&self.0).map_err(ProtocolError::MalformedSnapshot)?;
        let version = read_version(&state).ok_or(ProtocolError::MissingVersion(VERSION_KEY))?;
        Ok((state, version))
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded published message.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchMessage {
    /// Drop patch continuity and request a full snapshot.
    Bootstrap,
    /// Move the state one version forward.
    Patch(Patch),
}

impl PatchMessage {
    /// Decodes a published message.
    pub fn decode(message: &Message) -> ProtocolResult<Self> {
        if message.is_bootstrap() {
            return Ok(PatchMessage::Bootstrap);
        }
        serde_json::from_str(message.as_str())
            .map(PatchMessage::Patch)
            .map_err(ProtocolError::MalformedPatch)
    }
}

/// Reads the version field of a state value.
pub fn read_version(state: &Value) -> Option<u64> {
    state.get(VERSION_KEY).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_patch::PatchOperation;
    use serde_json::json;

    #[test]
    fn empty_message_is_bootstrap() {
        let msg = Message::bootstrap();
        assert!(msg.is_bootstrap());
        assert_eq!(msg.decode_patch().unwrap(), PatchMessage::Bootstrap);
    }

    #[test]
    fn decode_replace_patch() {
        let msg = Message::from(r#"[{"op":"replace","path":"/count","value":1}]"#);
        let PatchMessage::Patch(patch) = msg.decode_patch().unwrap() else {
            panic!("expected a patch");
        };
        assert_eq!(patch.0.len(), 1);
        match &patch.0[0] {
            PatchOperation::Replace(op) => {
                assert_eq!(op.path.as_str(), "/count");
                assert_eq!(op.value, json!(1));
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn garbage_is_malformed_patch() {
        let msg = Message::from("{not json");
        assert!(matches!(
            msg.decode_patch(),
            Err(ProtocolError::MalformedPatch(_))
        ));

        // Valid JSON, but not an operation array.
        let msg = Message::from(r#"{"op":"add"}"#);
        assert!(matches!(
            msg.decode_patch(),
            Err(ProtocolError::MalformedPatch(_))
        ));
    }

    #[test]
    fn patch_encoding_is_an_array() {
        let patch: Patch =
            serde_json::from_value(json!([{"op": "remove", "path": "/a/0"}])).unwrap();
        let msg = Message::from_patch(&patch).unwrap();
        assert!(msg.as_str().starts_with('['));
        assert!(!msg.is_bootstrap());
    }

    #[test]
    fn snapshot_requires_version() {
        let msg = Message::from(format!(r#"{{"count":3,"{VERSION_KEY}":7}}"#));
        let (state, version) = msg.decode_snapshot().unwrap();
        assert_eq!(version, 7);
        assert_eq!(state["count"], json!(3));

        let msg = Message::from(r#"{"count":3}"#);
        assert!(matches!(
            msg.decode_snapshot(),
            Err(ProtocolError::MissingVersion(VERSION_KEY))
        ));
    }
}
