//! Connection supervisor.
//!
//! One supervisor task runs per connection. It performs the handshake,
//! dispatches inbound frames in arrival order, and drives the bounded
//! reconnection loop:
//!
//! 1. Open the transport and send the handshake
//! 2. Wait for the `open` acknowledgement (bounded by `connect_timeout`)
//! 3. Pump frames to the router until the transport closes
//! 4. Sleep `reconnection_delay` and retry, up to `reconnection_attempts`
//!
//! The supervisor only touches the connection slot while its generation
//! still owns it; a replaced or disconnected supervisor exits quietly.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Notify, oneshot};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{Handshake, OpenAck, channel};
use crate::transport::{Link, TransportEvent};

use super::core::ClientInner;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Why the frame pump stopped.
enum PumpExit {
    /// The caller tore the connection down.
    Shutdown,
    /// The transport closed on its own.
    Closed(String),
}

// ============================================================================
// Supervisor
// ============================================================================

/// Owns one connection from first open until teardown or exhaustion.
pub(crate) struct Supervisor {
    inner: Arc<ClientInner>,
    generation: u64,
    handshake: Handshake,
    shutdown: Arc<Notify>,
    /// Resolves the `connect` call that spawned this supervisor.
    settled: Option<oneshot::Sender<Result<SessionId>>>,
}

impl Supervisor {
    /// Creates a supervisor for `generation`.
    pub fn new(
        inner: Arc<ClientInner>,
        generation: u64,
        handshake: Handshake,
        shutdown: Arc<Notify>,
        settled: oneshot::Sender<Result<SessionId>>,
    ) -> Self {
        Self {
            inner,
            generation,
            handshake,
            shutdown,
            settled: Some(settled),
        }
    }

    /// Runs until the connection is torn down or retries are exhausted.
    pub async fn run(mut self) {
        let options = self.inner.options.clone();
        let mut attempt: u32 = 0;

        loop {
            match self.open().await {
                Ok((link, session_id)) => {
                    // Ownership check and publish happen under one lock.
                    if !self.mark_connected(&link, &session_id) {
                        link.close();
                        debug!(generation = self.generation, "Connection discarded after open");
                        self.settle(Err(Error::ConnectionClosed));
                        return;
                    }
                    info!(session_id = %session_id, "Connected");

                    if attempt > 0 {
                        info!(attempt, "Reconnected");
                        self.inner.emit(channel::RECONNECTED, &Value::from(attempt));
                    }
                    self.inner
                        .emit(channel::CONNECTED, &Value::from(session_id.as_str()));
                    self.settle(Ok(session_id));
                    attempt = 0;

                    match self.pump(link).await {
                        PumpExit::Shutdown => {
                            debug!(generation = self.generation, "Supervisor stopped by disconnect");
                            return;
                        }
                        PumpExit::Closed(reason) => {
                            let owned = self.inner.update(self.generation, |slot| {
                                slot.state = ConnectionState::Reconnecting;
                                slot.session_id = None;
                                slot.sender = None;
                            });
                            if !owned {
                                return;
                            }

                            info!(%reason, "Connection lost");
                            self.inner.emit(channel::DISCONNECTED, &Value::from(reason));

                            if !options.reconnection {
                                self.inner.release(self.generation);
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    if !self.inner.is_current(self.generation) {
                        debug!(generation = self.generation, error = %e, "Open failed after disconnect");
                        self.settle(Err(Error::ConnectionClosed));
                        return;
                    }

                    warn!(error = %e, attempt, "Connect attempt failed");
                    self.inner
                        .emit(channel::CONNECT_ERROR, &Value::from(e.to_string()));

                    if !options.reconnection || !e.is_recoverable() {
                        self.inner.release(self.generation);
                        if self.settled.is_none() {
                            self.inner.emit(channel::RECONNECT_FAILED, &Value::Null);
                        }
                        self.settle(Err(e));
                        return;
                    }
                }
            }

            attempt += 1;
            if attempt > options.reconnection_attempts {
                warn!(attempts = options.reconnection_attempts, "Reconnection attempts exhausted");
                self.inner.release(self.generation);
                self.inner.emit(channel::RECONNECT_FAILED, &Value::Null);
                self.settle(Err(Error::reconnect_exhausted(
                    options.reconnection_attempts,
                )));
                return;
            }

            let owned = self.inner.update(self.generation, |slot| {
                slot.state = ConnectionState::Reconnecting;
                slot.retry_count = attempt;
            });
            if !owned {
                self.settle(Err(Error::ConnectionClosed));
                return;
            }

            debug!(
                attempt,
                delay_ms = options.reconnection_delay.as_millis() as u64,
                "Scheduling reconnection"
            );

            let shutdown = Arc::clone(&self.shutdown);
            tokio::select! {
                () = sleep(options.reconnection_delay) => {}
                () = shutdown.notified() => {
                    debug!(generation = self.generation, "Reconnection cancelled by disconnect");
                    self.settle(Err(Error::ConnectionClosed));
                    return;
                }
            }
        }
    }

    /// One open attempt bounded by `connect_timeout`.
    async fn open(&self) -> Result<(Link, SessionId)> {
        let limit = self.inner.options.connect_timeout;
        timeout(limit, self.establish())
            .await
            .map_err(|_| Error::connection_timeout(limit.as_millis() as u64))?
    }

    /// Opens a link, sends the handshake, and waits for the acknowledgement.
    ///
    /// Legacy frames arriving before the acknowledgement (such as
    /// `auth_error`) are dispatched normally.
    async fn establish(&self) -> Result<(Link, SessionId)> {
        let mut link = self.inner.connector.open().await?;

        debug!(client_type = %self.handshake.client_type, "Sending handshake");
        if !link.send(self.handshake.to_frame()?) {
            return Err(Error::transport_open("transport closed before handshake"));
        }

        loop {
            match link.recv().await {
                TransportEvent::Frame(frame) if frame.event == channel::OPEN => {
                    let ack = OpenAck::from_value(frame.data)
                        .map_err(|e| Error::protocol(format!("invalid open acknowledgement: {e}")))?;
                    return Ok((link, ack.sid));
                }
                TransportEvent::Frame(frame) => {
                    self.inner.router.route(frame);
                }
                TransportEvent::Closed { reason } => {
                    return Err(Error::transport_open(reason));
                }
            }
        }
    }

    /// Dispatches frames until the transport closes or a disconnect arrives.
    async fn pump(&self, mut link: Link) -> PumpExit {
        loop {
            tokio::select! {
                biased;

                () = self.shutdown.notified() => {
                    link.close();
                    return PumpExit::Shutdown;
                }

                event = link.recv() => match event {
                    TransportEvent::Frame(frame) if frame.event == channel::OPEN => {
                        debug!("Ignoring repeated open acknowledgement");
                    }
                    TransportEvent::Frame(frame) => {
                        self.inner.router.route(frame);
                    }
                    TransportEvent::Closed { reason } => {
                        return PumpExit::Closed(reason);
                    }
                },
            }
        }
    }

    /// Records the live link in the slot.
    ///
    /// Returns `false` if the slot was replaced or torn down meanwhile.
    fn mark_connected(&self, link: &Link, session_id: &SessionId) -> bool {
        self.inner.update(self.generation, |slot| {
            slot.state = ConnectionState::Connected;
            slot.session_id = Some(session_id.clone());
            slot.sender = Some(link.sender());
            slot.retry_count = 0;
        })
    }

    /// Resolves the pending `connect` call, once.
    fn settle(&mut self, result: Result<SessionId>) {
        if let Some(tx) = self.settled.take() {
            let _ = tx.send(result);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::client::RealtimeClient;
    use crate::client::options::ClientOptions;
    use crate::client::state::ConnectionSlot;
    use crate::credential::StaticCredentials;
    use crate::protocol::ClientType;
    use crate::transport::MemoryConnector;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_open_completing_after_teardown_is_not_published() {
        let (connector, mut acceptor) = MemoryConnector::new();
        let client = RealtimeClient::new(
            ClientOptions::new(),
            Arc::new(StaticCredentials::new("abc")),
            Arc::new(connector),
        );
        let inner = Arc::clone(&client.inner);

        let connected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&connected);
        client.on(channel::CONNECTED, move |sid| sink.lock().push(sid.clone()));

        let shutdown = Arc::new(Notify::new());
        let mut slot = ConnectionSlot::connecting(1, Arc::clone(&shutdown));
        slot.state = ConnectionState::Disconnecting;
        *inner.slot.lock() = Some(slot);

        let (settled_tx, settled_rx) = oneshot::channel();
        let supervisor = Supervisor::new(
            Arc::clone(&inner),
            1,
            Handshake::new("abc", ClientType::User),
            shutdown,
            settled_tx,
        );
        tokio::spawn(supervisor.run());

        let mut peer = acceptor.next().await.expect("peer");
        assert!(peer.accept("sid-late").await.is_some());

        let result = settled_rx.await.expect("settled");
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert!(peer.recv().await.is_none());
        assert!(connected.lock().is_empty());
        assert!(!client.is_connected());
        assert!(inner.slot.lock().as_ref().is_some_and(|s| s.sender.is_none()));
    }

    #[tokio::test]
    async fn test_malformed_acknowledgement_is_not_retried() {
        let (connector, mut acceptor) = MemoryConnector::new();
        let client = RealtimeClient::new(
            ClientOptions::new(),
            Arc::new(StaticCredentials::new("abc")),
            Arc::new(connector.clone()),
        );
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        client.on(channel::CONNECT_ERROR, move |e| sink.lock().push(e.clone()));

        tokio::spawn(async move {
            let mut peer = acceptor.next().await.expect("peer");
            peer.recv().await.expect("handshake");
            peer.emit(channel::OPEN, json!({"sid": ""}));
            // Hold the link open until the client gives up on it.
            while peer.recv().await.is_some() {}
        });

        let result = client.connect(ClientType::User).await;
        assert!(matches!(result, Err(Error::Protocol { .. })));
        assert_eq!(connector.attempt_count(), 1);
        assert_eq!(errors.lock().len(), 1);
        assert_eq!(client.state(), ConnectionState::Idle);
    }
}
