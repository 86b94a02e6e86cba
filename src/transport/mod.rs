//! Transport layer.
//!
//! A transport moves [`Frame`]s between this process and the realtime
//! server. The connection supervisor only ever sees a [`Link`]: a command
//! sender for outbound frames and a receiver for inbound [`TransportEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   LinkCommand    ┌──────────────┐               ┌────────┐
//! │  Supervisor task │ ───────────────► │  Pump task   │   WebSocket   │ Server │
//! │  (client)        │ ◄─────────────── │  (transport) │ ◄───────────► │        │
//! └──────────────────┘  TransportEvent  └──────────────┘               └────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | tokio-tungstenite connector and pump |
//! | `fallback` | Ordered transport preference |
//! | `memory` | In-process transport for tests and embedding |

// ============================================================================
// Submodules
// ============================================================================

/// Ordered transport preference.
pub mod fallback;

/// In-process transport.
pub mod memory;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::protocol::Frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use fallback::FallbackConnector;
pub use memory::{MemoryAcceptor, MemoryConnector, MemoryPeer};
pub use websocket::WebSocketConnector;

// ============================================================================
// Connector
// ============================================================================

/// Opens transport links to the realtime server.
///
/// Each call to [`open`](Connector::open) yields an independent link. The
/// client calls it once per connection attempt, including reconnects.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new link.
    ///
    /// # Errors
    ///
    /// Any error is treated as a failed open attempt and is eligible for
    /// automatic retry.
    async fn open(&self) -> Result<Link>;

    /// Short name used in logs.
    fn kind(&self) -> &'static str {
        "custom"
    }
}

// ============================================================================
// LinkCommand / TransportEvent
// ============================================================================

/// Commands from the client to a transport pump.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkCommand {
    /// Write a frame.
    Frame(Frame),
    /// Close the transport.
    Close,
}

/// Events from a transport pump to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A frame arrived.
    Frame(Frame),
    /// The transport closed; no further events follow.
    Closed {
        /// Human-readable closure reason.
        reason: String,
    },
}

// ============================================================================
// LinkSender
// ============================================================================

/// Cloneable write half of a [`Link`].
#[derive(Debug, Clone)]
pub struct LinkSender {
    commands: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkSender {
    /// Hands a frame to the transport.
    ///
    /// Returns `false` if the transport is gone. `true` means hand-off only,
    /// not delivery.
    #[inline]
    pub fn send(&self, frame: Frame) -> bool {
        self.commands.send(LinkCommand::Frame(frame)).is_ok()
    }

    /// Asks the transport to close.
    #[inline]
    pub fn close(&self) {
        let _ = self.commands.send(LinkCommand::Close);
    }

    /// Returns `true` if the transport has dropped its command receiver.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// ============================================================================
// Link
// ============================================================================

/// One open transport connection, as seen by the client.
#[derive(Debug)]
pub struct Link {
    sender: LinkSender,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Link {
    /// Creates a link from its two channel halves.
    ///
    /// Transport implementations keep the opposite ends: the command receiver
    /// and the event sender.
    #[inline]
    #[must_use]
    pub fn new(
        commands: mpsc::UnboundedSender<LinkCommand>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self {
            sender: LinkSender { commands },
            events,
        }
    }

    /// Creates a link along with the transport-side channel ends.
    #[must_use]
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<LinkCommand>,
        mpsc::UnboundedSender<TransportEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self::new(command_tx, event_rx), command_rx, event_tx)
    }

    /// Returns the write half.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> LinkSender {
        self.sender.clone()
    }

    /// Hands a frame to the transport.
    #[inline]
    pub fn send(&self, frame: Frame) -> bool {
        self.sender.send(frame)
    }

    /// Asks the transport to close.
    #[inline]
    pub fn close(&self) {
        self.sender.close();
    }

    /// Receives the next transport event.
    ///
    /// A dropped transport reads as `Closed`.
    pub async fn recv(&mut self) -> TransportEvent {
        self.events
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed {
                reason: "transport close".to_owned(),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn test_link_pair_roundtrip() {
        let (mut link, mut commands, events) = Link::pair();

        assert!(link.send(Frame::new("user_message", json!("hi"))));
        assert_eq!(
            commands.recv().await,
            Some(LinkCommand::Frame(Frame::new("user_message", json!("hi"))))
        );

        events
            .send(TransportEvent::Frame(Frame::new("chat_history", json!([]))))
            .expect("send");
        assert_eq!(
            link.recv().await,
            TransportEvent::Frame(Frame::new("chat_history", json!([])))
        );
    }

    #[tokio::test]
    async fn test_dropped_transport_reads_as_closed() {
        let (mut link, commands, events) = Link::pair();
        drop(events);
        drop(commands);

        assert!(matches!(link.recv().await, TransportEvent::Closed { .. }));
        assert!(!link.send(Frame::new("user_message", json!(null))));
        assert!(link.sender().is_closed());
    }
}
