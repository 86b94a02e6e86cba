//! Connection and reconnection options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use fintrack_realtime::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_connect_timeout(Duration::from_secs(10))
//!     .with_reconnection_attempts(3);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bound for one open attempt (transport + handshake).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Automatic reconnection attempts after a failure.
pub const DEFAULT_RECONNECTION_ATTEMPTS: u32 = 5;

/// Fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECTION_DELAY: Duration = Duration::from_millis(1_000);

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound for one open attempt, handshake included.
    pub connect_timeout: Duration,

    /// Retry automatically after open failures and transport loss.
    pub reconnection: bool,

    /// Attempts before giving up with `reconnect-failed`.
    pub reconnection_attempts: u32,

    /// Delay before each attempt.
    pub reconnection_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the default timeouts and retry policy.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnection: true,
            reconnection_attempts: DEFAULT_RECONNECTION_ATTEMPTS,
            reconnection_delay: DEFAULT_RECONNECTION_DELAY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the open attempt timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn with_reconnection(mut self, reconnection: bool) -> Self {
        self.reconnection = reconnection;
        self
    }

    /// Sets the number of reconnection attempts.
    #[inline]
    #[must_use]
    pub fn with_reconnection_attempts(mut self, attempts: u32) -> Self {
        self.reconnection_attempts = attempts;
        self
    }

    /// Sets the delay between reconnection attempts.
    #[inline]
    #[must_use]
    pub fn with_reconnection_delay(mut self, delay: Duration) -> Self {
        self.reconnection_delay = delay;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Checks the options for contradictions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero connect timeout, or for reconnection
    /// enabled with zero attempts.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }

        if self.reconnection && self.reconnection_attempts == 0 {
            return Err(Error::config(
                "reconnection_attempts must be at least 1 when reconnection is enabled.\n\
                 Use .with_reconnection(false) to disable retries.",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_millis(20_000));
        assert!(options.reconnection);
        assert_eq!(options.reconnection_attempts, 5);
        assert_eq!(options.reconnection_delay, Duration::from_millis(1_000));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let options = ClientOptions::new()
            .with_connect_timeout(Duration::from_secs(3))
            .with_reconnection_attempts(2)
            .with_reconnection_delay(Duration::from_millis(50));

        assert_eq!(options.connect_timeout, Duration::from_secs(3));
        assert_eq!(options.reconnection_attempts, 2);
        assert_eq!(options.reconnection_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_attempts_rejected_only_with_reconnection() {
        let options = ClientOptions::new().with_reconnection_attempts(0);
        assert!(options.validate().is_err());

        let options = options.with_reconnection(false);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let options = ClientOptions::new().with_connect_timeout(Duration::ZERO);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
    }
}
