//! Connection lifecycle state.
//!
//! ```text
//! Idle ──connect──► Connecting ──open ack──► Connected ──disconnect──► Disconnecting ──► Idle
//!                        │                     │    ▲
//!                   open failed          transport lost
//!                        ▼                     ▼    │
//!                      Reconnecting ───────────┘  (attempts exhausted ──► Idle)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::Notify;

use crate::identifiers::SessionId;
use crate::transport::LinkSender;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the process-wide connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Idle,
    /// First open attempt in flight.
    Connecting,
    /// Handshake acknowledged; frames flow.
    Connected,
    /// Waiting for or performing an automatic retry.
    Reconnecting,
    /// Caller-initiated teardown in progress.
    Disconnecting,
}

impl ConnectionState {
    /// Returns a short lowercase name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionSlot
// ============================================================================

/// The single live connection, owned by the client.
///
/// Only the supervisor task whose `generation` matches may update it.
#[derive(Debug)]
pub(crate) struct ConnectionSlot {
    /// Identifies the supervisor task that owns this connection.
    pub generation: u64,
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Session identity while connected.
    pub session_id: Option<SessionId>,
    /// Reconnection attempt in progress, 0 when connected.
    pub retry_count: u32,
    /// Write half of the open link while connected.
    pub sender: Option<LinkSender>,
    /// Wakes the supervisor for teardown.
    pub shutdown: Arc<Notify>,
}

impl ConnectionSlot {
    /// Creates a slot in the `Connecting` state.
    pub fn connecting(generation: u64, shutdown: Arc<Notify>) -> Self {
        Self {
            generation,
            state: ConnectionState::Connecting,
            session_id: None,
            retry_count: 0,
            sender: None,
            shutdown,
        }
    }

    /// Returns `true` if `generation` still owns this slot and may mutate it.
    #[inline]
    pub fn is_owned_by(&self, generation: u64) -> bool {
        self.generation == generation && self.state != ConnectionState::Disconnecting
    }
}

// ============================================================================
// Tests
// ============================================================================
