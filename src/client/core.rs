//! Realtime client coordinator.
//!
//! [`RealtimeClient`] owns the single process-wide connection and the
//! listener registry. Construct it once and share clones of the handle with
//! every call site.
//!
//! # Example
//!
//! ```no_run
//! use fintrack_realtime::{ClientType, RealtimeClient, StaticCredentials};
//! use serde_json::json;
//!
//! # async fn example() -> fintrack_realtime::Result<()> {
//! let client = RealtimeClient::builder()
//!     .url("wss://api.example.com/realtime")
//!     .credentials(StaticCredentials::new("token"))
//!     .build()?;
//!
//! client.on("user_message", |payload| println!("message: {payload}"));
//! let session_id = client.connect(ClientType::User).await?;
//!
//! client.send("user_message", json!({ "text": "How is my budget?" }));
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Notify, oneshot};
use tracing::{debug, info, trace, warn};

use crate::credential::CredentialProvider;
use crate::error::{Error, Result};
use crate::events::{Listener, ListenerRegistry, Router, Subscription};
use crate::identifiers::SessionId;
use crate::protocol::{ClientType, Frame, Handshake, channel};
use crate::transport::Connector;

use super::builder::ClientBuilder;
use super::options::ClientOptions;
use super::session::Supervisor;
use super::state::{ConnectionSlot, ConnectionState};

// ============================================================================
// Constants
// ============================================================================

/// Reason carried by `disconnected` for caller-initiated teardown.
const CLIENT_DISCONNECT: &str = "io client disconnect";

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct ClientInner {
    /// Lifecycle configuration.
    pub options: ClientOptions,

    /// Source of access tokens.
    pub credentials: Arc<dyn CredentialProvider>,

    /// Opens transport links.
    pub connector: Arc<dyn Connector>,

    /// Subscribers by event type.
    pub registry: ListenerRegistry,

    /// Inbound frame router over `registry`.
    pub router: Router,

    /// The live connection, if any.
    pub slot: Mutex<Option<ConnectionSlot>>,

    /// Last supervisor generation handed out.
    pub generation: AtomicU64,

    /// Serializes `connect` calls.
    pub connect_gate: tokio::sync::Mutex<()>,
}

impl ClientInner {
    /// Applies `f` to the slot if `generation` still owns it.
    ///
    /// Returns `false` if the connection was replaced or torn down.
    pub fn update<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut ConnectionSlot),
    {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(current) if current.is_owned_by(generation) => {
                f(current);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `generation` still owns the slot.
    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.update(generation, |_| {})
    }

    /// Drops the slot if `generation` still owns it.
    pub fn release(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|s| s.is_owned_by(generation)) {
            *slot = None;
            return true;
        }
        false
    }

    /// Emits a lifecycle or application event to the registry.
    #[inline]
    pub fn emit(&self, event: &str, payload: &Value) {
        self.registry.dispatch(event, payload);
    }

    /// Tears down the live connection without touching the registry.
    ///
    /// Wakes the supervisor, closes the link, and emits `disconnected` if the
    /// connection was up. Returns `false` if there was nothing to close.
    fn close_connection(&self) -> bool {
        let (generation, was_connected, sender, shutdown) = {
            let mut slot = self.slot.lock();
            let Some(current) = slot.as_mut() else {
                return false;
            };
            let was_connected = current.state == ConnectionState::Connected;
            current.state = ConnectionState::Disconnecting;
            (
                current.generation,
                was_connected,
                current.sender.take(),
                Arc::clone(&current.shutdown),
            )
        };

        shutdown.notify_one();
        if let Some(sender) = sender {
            sender.close();
        }

        if was_connected {
            self.emit(channel::DISCONNECTED, &Value::from(CLIENT_DISCONNECT));
        }

        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            *slot = None;
        }

        debug!(generation, was_connected, "Connection closed");
        true
    }
}

// ============================================================================
// RealtimeClient
// ============================================================================

/// Process-wide realtime event channel client.
///
/// Holds at most one connection at a time and multiplexes inbound events to
/// any number of listeners. Cloning yields another handle to the same client.
///
/// # Thread Safety
///
/// `RealtimeClient` is `Send + Sync`. Connection state and the registry are
/// mutex-guarded; `connect` calls are serialized.
#[derive(Clone)]
pub struct RealtimeClient {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// RealtimeClient - Display
// ============================================================================

impl fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("state", &self.state())
            .field("session_id", &self.current_session_id())
            .field("transport", &self.inner.connector.kind())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RealtimeClient - Constructor
// ============================================================================

impl RealtimeClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Assembles a client from validated parts.
    pub(crate) fn new(
        options: ClientOptions,
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let registry = ListenerRegistry::new();
        let router = Router::new(registry.clone());

        Self {
            inner: Arc::new(ClientInner {
                options,
                credentials,
                connector,
                registry,
                router,
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                connect_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

// ============================================================================
// RealtimeClient - Connection
// ============================================================================

impl RealtimeClient {
    /// Connects as `role`, or returns the live session.
    ///
    /// If already connected, emits `connected` again and returns the current
    /// session id without opening anything. A connection that exists but is
    /// not up (for example mid-reconnect) is torn down first. Otherwise a
    /// fresh token is fetched and the transport opened; open failures are
    /// retried per [`ClientOptions`] and reported as `connect-error` events.
    ///
    /// Concurrent calls are serialized: a call made while another is in
    /// flight waits for it and then takes the fast path.
    ///
    /// # Errors
    ///
    /// Transport failures are reported through `connect-error` events while
    /// retries remain. These are the only errors returned:
    ///
    /// - [`Error::CredentialUnavailable`] if no token could be obtained
    /// - [`Error::ReconnectExhausted`] once every attempt failed (after
    ///   `reconnect-failed` is emitted)
    /// - [`Error::ConnectionClosed`] if `disconnect` was called meanwhile
    /// - The open error itself when reconnection is disabled, or when it is
    ///   not recoverable (for example [`Error::Protocol`] for a malformed
    ///   acknowledgement)
    pub async fn connect(&self, role: ClientType) -> Result<SessionId> {
        let _gate = self.inner.connect_gate.lock().await;

        let existing = self
            .inner
            .slot
            .lock()
            .as_ref()
            .map(|slot| (slot.state, slot.session_id.clone()));

        match existing {
            Some((ConnectionState::Connected, Some(session_id))) => {
                debug!(session_id = %session_id, "Already connected");
                self.inner
                    .emit(channel::CONNECTED, &Value::from(session_id.as_str()));
                return Ok(session_id);
            }
            Some((state, _)) => {
                info!(%state, "Replacing connection that is not up");
                self.inner.close_connection();
            }
            None => {}
        }

        let access_token = self
            .inner
            .credentials
            .fetch()
            .await
            .map_err(|e| match e {
                Error::CredentialUnavailable { .. } => e,
                other => Error::credential_unavailable(other.to_string()),
            })?
            .into_token()?;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shutdown = Arc::new(Notify::new());
        *self.inner.slot.lock() = Some(ConnectionSlot::connecting(
            generation,
            Arc::clone(&shutdown),
        ));

        info!(%role, generation, transport = self.inner.connector.kind(), "Connecting");

        let (settled_tx, settled_rx) = oneshot::channel();
        let supervisor = Supervisor::new(
            Arc::clone(&self.inner),
            generation,
            Handshake::new(access_token, role),
            shutdown,
            settled_tx,
        );
        tokio::spawn(supervisor.run());

        settled_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Closes the connection and drops every listener.
    ///
    /// Emits `disconnected` first if the connection was up. Safe to call
    /// with no connection. A connection still opening is closed as soon as
    /// its open completes.
    pub fn disconnect(&self) {
        if !self.inner.close_connection() {
            debug!("Disconnect requested with no connection");
        }

        self.inner.registry.clear();
        info!("Disconnected; listener registry cleared");
    }

    /// Sends an event, fire-and-forget.
    ///
    /// Whitelisted direct event types go out on their own channel; everything
    /// else is enveloped on the generic outbound channel. Returns `true` once
    /// the frame is handed to the transport, `false` if not connected.
    pub fn send(&self, event_type: &str, payload: Value) -> bool {
        let sender = {
            let slot = self.inner.slot.lock();
            slot.as_ref()
                .filter(|s| s.state == ConnectionState::Connected)
                .and_then(|s| s.sender.clone())
        };

        let Some(sender) = sender else {
            let err = Error::send_while_disconnected(event_type);
            warn!(error = %err, "Send dropped");
            return false;
        };

        let frame = Frame::outbound(event_type, payload);
        trace!(event = %event_type, channel = %frame.event, "Sending");

        if !sender.send(frame) {
            let err = Error::send_while_disconnected(event_type);
            warn!(error = %err, "Transport gone");
            return false;
        }
        true
    }

    /// Returns `true` if the connection is up.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns the session id while connected.
    #[must_use]
    pub fn current_session_id(&self) -> Option<SessionId> {
        self.inner
            .slot
            .lock()
            .as_ref()
            .filter(|s| s.state == ConnectionState::Connected)
            .and_then(|s| s.session_id.clone())
    }

    /// Returns the connection lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner
            .slot
            .lock()
            .as_ref()
            .map_or(ConnectionState::Idle, |s| s.state)
    }

    /// Returns the reconnection attempt in progress, 0 if none.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.inner.slot.lock().as_ref().map_or(0, |s| s.retry_count)
    }

    /// Returns the lifecycle configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }
}

// ============================================================================
// RealtimeClient - Listeners
// ============================================================================

impl RealtimeClient {
    /// Registers `callback` for `event`.
    ///
    /// Works regardless of connection state. Call
    /// [`Subscription::unsubscribe`] to remove it.
    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.registry.on(event, callback)
    }

    /// Registers an existing listener handle for `event`.
    pub fn on_shared(&self, event: &str, listener: Listener) -> Subscription {
        self.inner.registry.on_shared(event, listener)
    }

    /// Registers a callback receiving the payload deserialized as `T`.
    pub fn on_typed<T, F>(&self, event: &str, callback: F) -> Subscription
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner.registry.on_typed(event, callback)
    }

    /// Removes the first registration of `listener` for `event`.
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        self.inner.registry.off(event, listener)
    }

    /// Removes every listener for `event`.
    pub fn remove_all(&self, event: &str) {
        self.inner.registry.remove_all(event);
    }

    /// Returns the listener registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }
}
