//! Ordered transport preference.
//!
//! Tries each configured connector in turn on every open attempt. The usual
//! order is streaming first, request/response polling after.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{Connector, Link};

// ============================================================================
// FallbackConnector
// ============================================================================

/// Connector that opens the first transport that succeeds.
#[derive(Clone)]
pub struct FallbackConnector {
    /// Connectors in preference order.
    connectors: Vec<Arc<dyn Connector>>,
}

impl fmt::Debug for FallbackConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = self.connectors.iter().map(|c| c.kind()).collect();
        f.debug_struct("FallbackConnector")
            .field("connectors", &kinds)
            .finish()
    }
}

impl FallbackConnector {
    /// Creates a fallback chain from connectors in preference order.
    #[inline]
    #[must_use]
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self { connectors }
    }

    /// Returns the number of connectors in the chain.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Returns `true` if the chain has no connectors.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[async_trait]
impl Connector for FallbackConnector {
    async fn open(&self) -> Result<Link> {
        let mut last_error = None;

        for connector in &self.connectors {
            match connector.open().await {
                Ok(link) => {
                    debug!(kind = connector.kind(), "Transport opened");
                    return Ok(link);
                }
                Err(e) => {
                    warn!(kind = connector.kind(), error = %e, "Transport open failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::config("No transports configured")))
    }

    fn kind(&self) -> &'static str {
        "fallback"
    }
}

// ============================================================================
// Tests
// ============================================================================
