//! Frame and envelope message types.
//!
//! # Format
//!
//! Every transport message is a JSON text frame:
//!
//! ```json
//! { "event": "user_message", "data": { ... } }
//! ```
//!
//! Enveloped frames carry the logical event type inside `data`:
//!
//! ```json
//! { "event": "client_event", "data": { "type": "custom_metric", "payload": 42 } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, to_string};

use crate::error::Result;

use super::channel;

// ============================================================================
// Frame
// ============================================================================

/// One discrete message on the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Channel name.
    pub event: String,

    /// Frame body. `null` when absent on the wire.
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// Creates a frame on `event` with body `data`.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Builds the outbound frame for a logical event.
    ///
    /// Whitelisted direct event types go out on their own channel; all others
    /// are wrapped in an [`Envelope`] on [`channel::OUTBOUND_ENVELOPE`].
    #[must_use]
    pub fn outbound(event_type: &str, payload: Value) -> Self {
        if channel::is_direct_outbound(event_type) {
            return Self::new(event_type, payload);
        }

        let envelope = Envelope::new(event_type, payload);
        Self::new(channel::OUTBOUND_ENVELOPE, envelope.into_value())
    }

    /// Serializes the frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    #[inline]
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Parses a frame from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a frame.
    #[inline]
    pub fn decode(text: &str) -> Result<Self> {
        Ok(from_str(text)?)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Envelope multiplexing many event types over one channel.
///
/// The core never inspects `payload`; listeners deserialize it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Logical event type.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Opaque event body.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Creates an envelope.
    #[inline]
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Parses an envelope out of a frame body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `type` is missing or
    /// not a string.
    #[inline]
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Converts the envelope into a frame body.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = serde_json::Map::with_capacity(2);
        map.insert("type".to_owned(), Value::String(self.event_type));
        map.insert("payload".to_owned(), self.payload);
        Value::Object(map)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_decode_without_data() {
        let frame = Frame::decode(r#"{"event":"admin_typing"}"#).expect("decode");
        assert_eq!(frame.event, "admin_typing");
        assert_eq!(frame.data, Value::Null);
    }

    #[test]
    fn test_decode_rejects_non_frame() {
        assert!(Frame::decode(r#"{"data":1}"#).is_err());
        assert!(Frame::decode("not json").is_err());
    }

    #[test]
    fn test_encode_shape() {
        let frame = Frame::new("user_message", json!({"text": "hi"}));
        let text = frame.encode().expect("encode");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value, json!({"event": "user_message", "data": {"text": "hi"}}));
    }

    #[test]
    fn test_outbound_direct() {
        let frame = Frame::outbound("user_message", json!("hello"));
        assert_eq!(frame.event, "user_message");
        assert_eq!(frame.data, json!("hello"));
    }

    #[test]
    fn test_outbound_test_connection_is_direct() {
        let frame = Frame::outbound("test_connection", Value::Null);
        assert_eq!(frame.event, "test_connection");
    }

    #[test]
    fn test_outbound_enveloped() {
        let frame = Frame::outbound("custom_metric", json!(42));
        assert_eq!(frame.event, "client_event");
        assert_eq!(frame.data, json!({"type": "custom_metric", "payload": 42}));
    }

    #[test]
    fn test_envelope_missing_payload_is_null() {
        let envelope = Envelope::from_value(json!({"type": "goal_updated"})).expect("parse");
        assert_eq!(envelope.event_type, "goal_updated");
        assert_eq!(envelope.payload, Value::Null);
    }

    #[test]
    fn test_envelope_requires_string_type() {
        assert!(Envelope::from_value(json!({"type": 7, "payload": {}})).is_err());
        assert!(Envelope::from_value(json!({"payload": {}})).is_err());
    }

    proptest! {
        #[test]
        fn prop_non_whitelisted_types_are_enveloped(event_type in "[a-z][a-z_]{0,24}") {
            prop_assume!(!channel::is_direct_outbound(&event_type));

            let frame = Frame::outbound(&event_type, json!({"n": 1}));
            prop_assert_eq!(frame.event.as_str(), channel::OUTBOUND_ENVELOPE);

            let envelope = Envelope::from_value(frame.data).expect("envelope");
            prop_assert_eq!(envelope.event_type, event_type);
            prop_assert_eq!(envelope.payload, json!({"n": 1}));
        }
    }
}
