//! FinTrack Realtime - event channel client for the FinTrack chat backend.
//!
//! This library maintains a single authenticated realtime connection to the
//! server and fans inbound events out to any number of listeners.
//!
//! # Architecture
//!
//! The client follows a supervisor model:
//!
//! - **Connection manager**: [`RealtimeClient`] owns at most one connection;
//!   a spawned supervisor task performs the handshake, pumps frames, and runs
//!   the bounded reconnection loop
//! - **Listener registry**: event type to ordered listener list, isolated
//!   against panicking callbacks
//! - **Dispatch router**: whitelisted channels dispatch under their own name,
//!   everything else arrives in a `{type, payload}` envelope
//!
//! Lifecycle changes are published through the same registry as application
//! events: `connected`, `disconnected`, `connect-error`, `reconnected`, and
//! `reconnect-failed`.
//!
//! # Quick Start
//!
//! ```no_run
//! use fintrack_realtime::{ClientType, RealtimeClient, Result, StaticCredentials};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = RealtimeClient::builder()
//!         .url("wss://api.example.com/realtime")
//!         .credentials(StaticCredentials::new("access-token"))
//!         .build()?;
//!
//!     client.on("user_message", |payload| println!("message: {payload}"));
//!     client.on("disconnected", |reason| println!("lost connection: {reason}"));
//!
//!     let session_id = client.connect(ClientType::User).await?;
//!     println!("session {session_id}");
//!
//!     client.send("user_message", json!({ "text": "How much did I spend?" }));
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Connection manager: [`RealtimeClient`], [`ClientBuilder`] |
//! | [`credential`] | Access token provider seam |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Listener registry and inbound router |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire frame types |
//! | [`transport`] | WebSocket, fallback, and in-process transports |

// ============================================================================
// Modules
// ============================================================================

/// Connection manager and configuration.
///
/// Use [`RealtimeClient::builder()`] to create a configured client.
pub mod client;

/// Access token provider interface.
pub mod credential;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Listener registry and inbound dispatch.
pub mod events;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire protocol message types.
///
/// Frames, envelopes, and handshake messages.
pub mod protocol;

/// Transport layer.
///
/// The [`Connector`] seam plus WebSocket, fallback, and in-process
/// implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientOptions, ConnectionState, RealtimeClient};

// Credential types
pub use credential::{CredentialProvider, CredentialResponse, StaticCredentials, TokenData};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{Listener, ListenerRegistry, Subscription};

// Identifier types
pub use identifiers::SessionId;

// Protocol types
pub use protocol::{ClientType, Envelope, Frame, channel};

// Transport types
pub use transport::{
    Connector, FallbackConnector, Link, LinkSender, MemoryAcceptor, MemoryConnector, MemoryPeer,
    TransportEvent, WebSocketConnector,
};
