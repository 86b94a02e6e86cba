//! Realtime client and connection lifecycle.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RealtimeClient`] | Connection manager and listener front end |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timeouts and reconnection policy |
//! | [`ConnectionState`] | Lifecycle state of the connection |
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──connect──▶ Connecting ──open ack──▶ Connected
//!                        │                      │
//!                        │ open fails           │ transport closes
//!                        ▼                      ▼
//!                   Reconnecting ◀──────────────┘
//!                        │
//!                        │ attempts exhausted ──▶ Idle (reconnect-failed)
//!
//! any state ──disconnect──▶ Disconnecting ──▶ Idle
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Client coordinator.
pub mod core;

/// Lifecycle options.
pub mod options;

/// Per-connection supervisor task.
mod session;

/// Connection state.
pub mod state;


// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::RealtimeClient;
pub use options::ClientOptions;
pub use state::ConnectionState;
