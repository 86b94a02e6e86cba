//! WebSocket transport.
//!
//! Opens a client WebSocket to the realtime server and spawns a pump task
//! that shuttles frames between the socket and the [`Link`].
//!
//! # Pump
//!
//! The pump is a single `tokio::select!` loop handling:
//!
//! - Incoming text messages, decoded into [`Frame`]s
//! - Outgoing [`LinkCommand`]s from the client
//! - Close and error conditions, reported once as [`TransportEvent::Closed`]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::{Connector, Link, LinkCommand, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the WebSocket upgrade.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Reason reported when the socket ends without a close frame reason.
const TRANSPORT_CLOSE: &str = "transport close";

/// Reason reported when the socket fails.
const TRANSPORT_ERROR: &str = "transport error";

// ============================================================================
// Types
// ============================================================================

/// Socket type produced by `connect_async`.
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Streaming transport over a client WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    /// Server endpoint (`ws://` or `wss://`).
    url: Url,
    /// Upper bound for the WebSocket upgrade.
    connect_timeout: Duration,
}

impl WebSocketConnector {
    /// Creates a connector for `url` with the default 20s upgrade timeout.
    #[inline]
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the upgrade timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the server endpoint.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self) -> Result<Link> {
        debug!(url = %self.url, "Opening WebSocket");

        let (socket, _response) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(self.connect_timeout.as_millis() as u64))??;

        info!(url = %self.url, "WebSocket connection established");

        let (link, command_rx, event_tx) = Link::pair();
        tokio::spawn(run_pump(socket, command_rx, event_tx));

        Ok(link)
    }

    fn kind(&self) -> &'static str {
        "websocket"
    }
}

// ============================================================================
// Pump
// ============================================================================

/// Shuttles frames between the socket and the link until either side closes.
async fn run_pump(
    socket: Socket,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut ws_write, mut ws_read) = socket.split();

    loop {
        tokio::select! {
            // Incoming messages from server
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match Frame::decode(&text) {
                            Ok(frame) => {
                                if event_tx.send(TransportEvent::Frame(frame)).is_err() {
                                    debug!("Link receiver dropped");
                                    let _ = ws_write.close().await;
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, text = %text.as_str(), "Failed to parse incoming frame");
                            }
                        }
                    }

                    Some(Ok(Message::Close(close))) => {
                        let reason = close
                            .map(|c| c.reason.as_str().to_owned())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| TRANSPORT_CLOSE.to_owned());
                        debug!(%reason, "WebSocket closed by remote");
                        let _ = event_tx.send(TransportEvent::Closed { reason });
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        let _ = event_tx.send(TransportEvent::Closed {
                            reason: TRANSPORT_ERROR.to_owned(),
                        });
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        let _ = event_tx.send(TransportEvent::Closed {
                            reason: TRANSPORT_CLOSE.to_owned(),
                        });
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            // Commands from client
            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Frame(frame)) => {
                        match frame.encode() {
                            Ok(json) => {
                                if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                                    warn!(error = %e, event = %frame.event, "Failed to write frame");
                                } else {
                                    trace!(event = %frame.event, "Frame sent");
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, event = %frame.event, "Failed to encode frame");
                            }
                        }
                    }

                    Some(LinkCommand::Close) | None => {
                        debug!("Close requested by client");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    debug!("WebSocket pump terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use serde_json::json;
    use tokio::net::TcpListener;

    /// Binds a one-shot WebSocket server that echoes every text frame.
    async fn echo_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("upgrade");
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() && ws.send(message).await.is_err() {
                    break;
                }
            }
        });

        addr
    }

    #[test]
    fn test_default_timeout() {
        let connector = WebSocketConnector::new(Url::parse("ws://127.0.0.1:1").expect("url"));
        assert_eq!(connector.connect_timeout, Duration::from_millis(20_000));
        assert_eq!(connector.kind(), "websocket");
    }

    #[tokio::test]
    async fn test_open_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("url");
        let result = WebSocketConnector::new(url).open().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_frames_roundtrip_through_socket() {
        let addr = echo_server().await;
        let url = Url::parse(&format!("ws://{addr}")).expect("url");
        let mut link = WebSocketConnector::new(url).open().await.expect("open");

        let frame = Frame::new("user_message", json!({"text": "budget?"}));
        assert!(link.send(frame.clone()));
        assert_eq!(link.recv().await, TransportEvent::Frame(frame));

        link.close();
    }
}
