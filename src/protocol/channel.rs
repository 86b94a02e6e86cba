//! Transport channel names and lifecycle event names.
//!
//! Every frame travels on a named channel. A handful of legacy channels map
//! one-to-one onto an event type; everything else is multiplexed through the
//! two generic envelope channels.
//!
//! | Channel | Direction | Purpose |
//! |---------|-----------|---------|
//! | `connection_confirmed` | both | Server confirms the session |
//! | `chat_history` | both | Chat backlog |
//! | `user_message` | both | Plain chat message |
//! | `admin_typing` | both | Admin typing indicator |
//! | `bot_stop_typing` | both | Bot stopped typing |
//! | `auth_error` | both | Token rejected |
//! | `test_connection` | out | Connectivity probe |
//! | `client_event` | out | Envelope `{type, payload}` |
//! | `server_event` | in | Envelope `{type, payload}` |
//! | `handshake` / `open` | out / in | Transport handshake |

// ============================================================================
// Direct Channels
// ============================================================================

/// Server confirms the session after connecting.
pub const CONNECTION_CONFIRMED: &str = "connection_confirmed";

/// Chat history backlog.
pub const CHAT_HISTORY: &str = "chat_history";

/// Plain user chat message.
pub const USER_MESSAGE: &str = "user_message";

/// Admin typing indicator.
pub const ADMIN_TYPING: &str = "admin_typing";

/// Bot stopped typing.
pub const BOT_STOP_TYPING: &str = "bot_stop_typing";

/// Access token rejected by the server.
pub const AUTH_ERROR: &str = "auth_error";

/// Outbound-only connectivity probe.
pub const TEST_CONNECTION: &str = "test_connection";

/// Channels whose name is the event type, in both directions.
pub const DIRECT_CHANNELS: &[&str] = &[
    CONNECTION_CONFIRMED,
    CHAT_HISTORY,
    USER_MESSAGE,
    ADMIN_TYPING,
    BOT_STOP_TYPING,
    AUTH_ERROR,
];

// ============================================================================
// Envelope Channels
// ============================================================================

/// Client to server envelope channel.
pub const OUTBOUND_ENVELOPE: &str = "client_event";

/// Server to client envelope channel.
pub const INBOUND_ENVELOPE: &str = "server_event";

// ============================================================================
// Transport Control
// ============================================================================

/// Client handshake frame carrying the credential and client type.
pub const HANDSHAKE: &str = "handshake";

/// Server acknowledgement carrying the session id.
pub const OPEN: &str = "open";

// ============================================================================
// Lifecycle Events
// ============================================================================

/// Emitted when a connection reaches `Connected`. Payload: session id.
pub const CONNECTED: &str = "connected";

/// Emitted when a connection closes. Payload: reason string.
pub const DISCONNECTED: &str = "disconnected";

/// Emitted when an open attempt fails. Payload: message string.
pub const CONNECT_ERROR: &str = "connect-error";

/// Emitted when a reconnection attempt succeeds. Payload: attempt number.
pub const RECONNECTED: &str = "reconnected";

/// Emitted once all reconnection attempts are exhausted. Payload: null.
pub const RECONNECT_FAILED: &str = "reconnect-failed";

// ============================================================================
// Predicates
// ============================================================================

/// Returns `true` if inbound frames on `channel` are dispatched under the
/// channel name itself.
#[inline]
#[must_use]
pub fn is_direct_inbound(channel: &str) -> bool {
    DIRECT_CHANNELS.contains(&channel)
}

/// Returns `true` if `event_type` is sent as a named frame rather than an
/// envelope.
#[inline]
#[must_use]
pub fn is_direct_outbound(event_type: &str) -> bool {
    event_type == TEST_CONNECTION || DIRECT_CHANNELS.contains(&event_type)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_inbound() {
        assert!(is_direct_inbound(USER_MESSAGE));
        assert!(is_direct_inbound(AUTH_ERROR));
        assert!(!is_direct_inbound(TEST_CONNECTION));
        assert!(!is_direct_inbound(INBOUND_ENVELOPE));
        assert!(!is_direct_inbound("custom_metric"));
    }

    #[test]
    fn test_direct_outbound() {
        assert!(is_direct_outbound(USER_MESSAGE));
        assert!(is_direct_outbound(TEST_CONNECTION));
        assert!(!is_direct_outbound("custom_metric"));
        assert!(!is_direct_outbound(OUTBOUND_ENVELOPE));
    }
}
