//! Handshake message types.
//!
//! After the transport opens, the client sends a `handshake` frame and waits
//! for the server's `open` acknowledgement:
//!
//! ```json
//! { "event": "handshake", "data": { "accessToken": "...", "clientType": "user" } }
//! { "event": "open", "data": { "sid": "..." } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::SessionId;

use super::channel;
use super::frame::Frame;

// ============================================================================
// ClientType
// ============================================================================

/// Class of client identity presented at handshake time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Regular end user.
    #[default]
    User,
    /// Back-office administrator.
    Admin,
}

impl ClientType {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// Parameters the client presents when opening a session.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Short-lived access token from the credential provider.
    pub access_token: String,
    /// Client identity class.
    pub client_type: ClientType,
}

impl Handshake {
    /// Creates handshake parameters.
    #[inline]
    #[must_use]
    pub fn new(access_token: impl Into<String>, client_type: ClientType) -> Self {
        Self {
            access_token: access_token.into(),
            client_type,
        }
    }

    /// Builds the `handshake` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_frame(&self) -> Result<Frame> {
        Ok(Frame::new(channel::HANDSHAKE, serde_json::to_value(self)?))
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("access_token", &"<redacted>")
            .field("client_type", &self.client_type)
            .finish()
    }
}

// ============================================================================
// OpenAck
// ============================================================================

/// Server acknowledgement of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenAck {
    /// Session identity assigned by the server.
    pub sid: SessionId,
}

impl OpenAck {
    /// Parses the body of an `open` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `sid` is missing or empty.
    #[inline]
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
