//! Error types for the realtime channel client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use fintrack_realtime::{ClientType, Result};
//!
//! async fn example(client: &RealtimeClient) -> Result<()> {
//!     let session_id = client.connect(ClientType::User).await?;
//!     println!("connected as {session_id}");
//!     Ok(())
//! }
//! ```
//!
//! Most failures in this crate never reach the caller as an `Err`. Transport
//! failures become `connect-error` / `reconnect-failed` events, listener panics
//! are logged, and `send` reports a `bool`. The variants for those cases still
//! exist so they can be logged with a consistent shape.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Credentials | [`Error::CredentialUnavailable`] |
//! | Connection | [`Error::TransportOpen`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::ReconnectExhausted`] |
//! | Dispatch | [`Error::ListenerPanicked`], [`Error::SendWhileDisconnected`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`ClientBuilder::build`](crate::ClientBuilder::build) when
    /// the client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Credential Errors
    // ========================================================================
    /// The credential provider failed or reported non-success.
    ///
    /// Fatal for the `connect` call that triggered it; never retried.
    #[error("Credential unavailable: {message}")]
    CredentialUnavailable {
        /// Why no access token could be obtained.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The transport could not be opened or the handshake was refused.
    ///
    /// Recoverable: surfaced as a `connect-error` event while the reconnect
    /// loop keeps trying.
    #[error("Transport open failed: {message}")]
    TransportOpen {
        /// Description of the open failure.
        message: String,
    },

    /// Opening the transport and completing the handshake took too long.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The connection was closed, locally or by the remote end.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Every automatic reconnection attempt failed.
    ///
    /// Terminal until the next manual `connect`.
    #[error("Reconnection failed after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// A listener callback panicked during dispatch.
    ///
    /// Isolated per listener; only ever logged.
    #[error("Listener for '{event}' panicked: {message}")]
    ListenerPanicked {
        /// Event type being dispatched.
        event: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// `send` was called without a connected transport.
    #[error("Cannot send '{event}': not connected")]
    SendWhileDisconnected {
        /// Event type the caller tried to send.
        event: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a credential unavailable error.
    #[inline]
    pub fn credential_unavailable(message: impl Into<String>) -> Self {
        Self::CredentialUnavailable {
            message: message.into(),
        }
    }

    /// Creates a transport open error.
    #[inline]
    pub fn transport_open(message: impl Into<String>) -> Self {
        Self::TransportOpen {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a reconnect exhausted error.
    #[inline]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::ReconnectExhausted { attempts }
    }

    /// Creates a listener panicked error.
    #[inline]
    pub fn listener_panicked(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ListenerPanicked {
            event: event.into(),
            message: message.into(),
        }
    }

    /// Creates a send while disconnected error.
    #[inline]
    pub fn send_while_disconnected(event: impl Into<String>) -> Self {
        Self::SendWhileDisconnected {
            event: event.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if the reconnect loop may retry after this error.
    ///
    /// Credential, configuration and protocol failures are never retried;
    /// the pending `connect` fails with them directly.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportOpen { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport_open("refused");
        assert_eq!(err.to_string(), "Transport open failed: refused");
    }

    #[test]
    fn test_credential_error_display() {
        let err = Error::credential_unavailable("provider reported failure");
        assert_eq!(
            err.to_string(),
            "Credential unavailable: provider reported failure"
        );
    }

    #[test]
    fn test_listener_panicked_display() {
        let err = Error::listener_panicked("user_message", "boom");
        assert_eq!(err.to_string(), "Listener for 'user_message' panicked: boom");
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::connection_timeout(20_000).is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::transport_open("x").is_recoverable());
        assert!(Error::connection_timeout(1).is_recoverable());
        assert!(!Error::credential_unavailable("x").is_recoverable());
        assert!(!Error::reconnect_exhausted(5).is_recoverable());
        assert!(!Error::protocol("bad ack").is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
