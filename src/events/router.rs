//! Dispatch router.
//!
//! Resolves the logical event type of each inbound frame and hands the
//! payload to the [`ListenerRegistry`].
//!
//! | Channel | Event type | Payload |
//! |---------|------------|---------|
//! | direct/legacy | channel name | frame body |
//! | `server_event` | envelope `type` | envelope `payload` |
//! | anything else | dropped | - |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::{Envelope, Frame, channel};

use super::ListenerRegistry;

// ============================================================================
// Inbound
// ============================================================================

/// An inbound frame with its logical event type resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Dispatchable event.
    Event {
        /// Logical event type.
        event_type: String,
        /// Opaque payload.
        payload: Value,
    },
    /// Frame on a channel this client does not route.
    Unrouted {
        /// Channel the frame arrived on.
        channel: String,
    },
}

impl Inbound {
    /// Resolves a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if an envelope frame has no
    /// string `type`.
    pub fn resolve(frame: Frame) -> Result<Self> {
        let Frame { event, data } = frame;

        if channel::is_direct_inbound(&event) {
            return Ok(Self::Event {
                event_type: event,
                payload: data,
            });
        }

        if event == channel::INBOUND_ENVELOPE {
            let Envelope {
                event_type,
                payload,
            } = Envelope::from_value(data)?;
            return Ok(Self::Event {
                event_type,
                payload,
            });
        }

        Ok(Self::Unrouted { channel: event })
    }
}

// ============================================================================
// Router
// ============================================================================

/// Routes inbound frames to registered listeners.
#[derive(Debug, Clone)]
pub struct Router {
    registry: ListenerRegistry,
}

impl Router {
    /// Creates a router dispatching into `registry`.
    #[inline]
    #[must_use]
    pub fn new(registry: ListenerRegistry) -> Self {
        Self { registry }
    }

    /// Dispatches one frame synchronously.
    ///
    /// Every listener for the frame's event type has run (or panicked) when
    /// this returns. Returns the resolved event type, or `None` if the frame
    /// was dropped.
    pub fn route(&self, frame: Frame) -> Option<String> {
        match Inbound::resolve(frame) {
            Ok(Inbound::Event {
                event_type,
                payload,
            }) => {
                let invoked = self.registry.dispatch(&event_type, &payload);
                trace!(event = %event_type, invoked, "Frame dispatched");
                Some(event_type)
            }
            Ok(Inbound::Unrouted { channel }) => {
                debug!(%channel, "Dropping frame on unrouted channel");
                None
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed envelope");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
