//! In-process transport.
//!
//! [`MemoryConnector`] opens links whose server side is handed to a
//! [`MemoryAcceptor`] as a [`MemoryPeer`]. Useful for exercising the client
//! without a network, and for embedding a server in the same process.
//!
//! # Example
//!
//! ```ignore
//! let (connector, mut acceptor) = MemoryConnector::new();
//!
//! tokio::spawn(async move {
//!     while let Some(mut peer) = acceptor.next().await {
//!         peer.accept("session-1").await;
//!         peer.emit("user_message", json!({"text": "hello"}));
//!     }
//! });
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Frame, channel};

use super::{Connector, Link, LinkCommand, TransportEvent};

// ============================================================================
// MemoryConnector
// ============================================================================

/// Shared counters and switches behind a [`MemoryConnector`].
#[derive(Debug)]
struct MemoryState {
    /// Refuse every open while set.
    refusing: AtomicBool,
    /// Every call to `open`.
    attempts: AtomicUsize,
    /// Opens that produced a link.
    opens: AtomicUsize,
    /// Server sides of opened links.
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
}

/// Connector producing in-process links.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    state: Arc<MemoryState>,
}

impl MemoryConnector {
    /// Creates a connector and the acceptor receiving server sides.
    #[must_use]
    pub fn new() -> (Self, MemoryAcceptor) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        let state = Arc::new(MemoryState {
            refusing: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            accept_tx,
        });

        (Self { state }, MemoryAcceptor { accept_rx })
    }

    /// Makes subsequent opens fail (or succeed again).
    #[inline]
    pub fn set_refusing(&self, refusing: bool) {
        self.state.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Returns the number of open attempts, successful or not.
    #[inline]
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Returns the number of links opened.
    #[inline]
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self) -> Result<Link> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);

        if self.state.refusing.load(Ordering::SeqCst) {
            return Err(Error::transport_open("connection refused"));
        }

        let (link, commands, events) = Link::pair();
        self.state
            .accept_tx
            .send(MemoryPeer { commands, events })
            .map_err(|_| Error::transport_open("acceptor dropped"))?;

        self.state.opens.fetch_add(1, Ordering::SeqCst);
        debug!("Memory link opened");

        Ok(link)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// MemoryAcceptor
// ============================================================================

/// Receives the server side of every link a [`MemoryConnector`] opens.
#[derive(Debug)]
pub struct MemoryAcceptor {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryAcceptor {
    /// Waits for the next opened link.
    ///
    /// Returns `None` once every connector clone is dropped.
    pub async fn next(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Server side of an in-process link.
#[derive(Debug)]
pub struct MemoryPeer {
    commands: mpsc::UnboundedReceiver<LinkCommand>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MemoryPeer {
    /// Receives the next frame written by the client.
    ///
    /// Returns `None` once the client closes or drops the link.
    pub async fn recv(&mut self) -> Option<Frame> {
        match self.commands.recv().await {
            Some(LinkCommand::Frame(frame)) => Some(frame),
            Some(LinkCommand::Close) | None => None,
        }
    }

    /// Completes the handshake, assigning `sid`.
    ///
    /// Returns the handshake body the client presented, or `None` if the
    /// first frame was not a handshake or the client went away.
    pub async fn accept(&mut self, sid: &str) -> Option<Value> {
        let frame = self.recv().await?;
        if frame.event != channel::HANDSHAKE {
            return None;
        }

        self.emit(channel::OPEN, json!({ "sid": sid }));
        Some(frame.data)
    }

    /// Delivers a frame to the client.
    #[inline]
    pub fn send(&self, frame: Frame) -> bool {
        self.events.send(TransportEvent::Frame(frame)).is_ok()
    }

    /// Delivers a frame on `event` with body `data`.
    #[inline]
    pub fn emit(&self, event: &str, data: Value) -> bool {
        self.send(Frame::new(event, data))
    }

    /// Closes the link from the server side.
    pub fn close(self, reason: &str) {
        let _ = self.events.send(TransportEvent::Closed {
            reason: reason.to_owned(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refusing_counts_attempts() {
        let (connector, _acceptor) = MemoryConnector::new();
        connector.set_refusing(true);

        assert!(connector.open().await.is_err());
        assert_eq!(connector.attempt_count(), 1);
        assert_eq!(connector.open_count(), 0);

        connector.set_refusing(false);
        assert!(connector.open().await.is_ok());
        assert_eq!(connector.attempt_count(), 2);
        assert_eq!(connector.open_count(), 1);
    }

    #[tokio::test]
    async fn test_open_fails_without_acceptor() {
        let (connector, acceptor) = MemoryConnector::new();
        drop(acceptor);

        assert!(matches!(
            connector.open().await,
            Err(Error::TransportOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_handshake() {
        let (connector, mut acceptor) = MemoryConnector::new();
        let mut link = connector.open().await.expect("open");
        let mut peer = acceptor.next().await.expect("peer");

        link.send(Frame::new(channel::HANDSHAKE, json!({"accessToken": "t"})));
        let body = peer.accept("sid-1").await.expect("handshake");
        assert_eq!(body, json!({"accessToken": "t"}));

        assert_eq!(
            link.recv().await,
            TransportEvent::Frame(Frame::new(channel::OPEN, json!({"sid": "sid-1"})))
        );
    }

    #[tokio::test]
    async fn test_client_close_ends_peer() {
        let (connector, mut acceptor) = MemoryConnector::new();
        let link = connector.open().await.expect("open");
        let mut peer = acceptor.next().await.expect("peer");

        link.close();
        assert!(peer.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_server_close_reaches_client() {
        let (connector, mut acceptor) = MemoryConnector::new();
        let mut link = connector.open().await.expect("open");
        let peer = acceptor.next().await.expect("peer");

        peer.close("server shutting down");
        assert_eq!(
            link.recv().await,
            TransportEvent::Closed {
                reason: "server shutting down".to_owned()
            }
        );
    }
}
