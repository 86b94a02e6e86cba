//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use fintrack_realtime::{RealtimeClient, StaticCredentials};
//!
//! # fn example() -> fintrack_realtime::Result<()> {
//! let client = RealtimeClient::builder()
//!     .url("wss://api.example.com/realtime")
//!     .credentials(StaticCredentials::new("token"))
//!     .reconnection_delay(Duration::from_millis(500))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::credential::CredentialProvider;
use crate::error::{Error, Result};
use crate::transport::{Connector, FallbackConnector, WebSocketConnector};

use super::core::RealtimeClient;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`RealtimeClient`].
///
/// Use [`RealtimeClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ClientBuilder {
    /// Server endpoint for the default WebSocket transport.
    url: Option<String>,
    /// Access token source.
    credentials: Option<Arc<dyn CredentialProvider>>,
    /// Extra transports, in preference order after the WebSocket one.
    transports: Vec<Arc<dyn Connector>>,
    /// Lifecycle options.
    options: ClientOptions,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transports: Vec<_> = self.transports.iter().map(|t| t.kind()).collect();
        f.debug_struct("ClientBuilder")
            .field("url", &self.url)
            .field("credentials", &self.credentials.is_some())
            .field("transports", &transports)
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default options and no endpoint.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the realtime endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the credential provider.
    #[inline]
    #[must_use]
    pub fn credentials<P>(mut self, provider: P) -> Self
    where
        P: CredentialProvider + 'static,
    {
        self.credentials = Some(Arc::new(provider));
        self
    }

    /// Sets a shared credential provider.
    #[inline]
    #[must_use]
    pub fn shared_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Adds a transport.
    ///
    /// Transports are tried in the order added, after the WebSocket transport
    /// for [`url`](Self::url) if one was set.
    #[inline]
    #[must_use]
    pub fn transport<C>(mut self, connector: C) -> Self
    where
        C: Connector + 'static,
    {
        self.transports.push(Arc::new(connector));
        self
    }

    /// Replaces all lifecycle options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the open attempt timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.options.connect_timeout = connect_timeout;
        self
    }

    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn reconnection(mut self, reconnection: bool) -> Self {
        self.options.reconnection = reconnection;
        self
    }

    /// Sets the number of reconnection attempts.
    #[inline]
    #[must_use]
    pub fn reconnection_attempts(mut self, attempts: u32) -> Self {
        self.options.reconnection_attempts = attempts;
        self
    }

    /// Sets the delay between reconnection attempts.
    #[inline]
    #[must_use]
    pub fn reconnection_delay(mut self, delay: Duration) -> Self {
        self.options.reconnection_delay = delay;
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no credential provider is set
    /// - [`Error::Config`] if neither a URL nor a transport is set
    /// - [`Error::Url`] / [`Error::Config`] for an unparseable or non-WebSocket URL
    /// - [`Error::Config`] for contradictory options
    pub fn build(self) -> Result<RealtimeClient> {
        self.options.validate()?;
        let credentials = self.validate_credentials()?;
        let connector = self.validate_transports()?;

        Ok(RealtimeClient::new(self.options, credentials, connector))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the credential provider configuration.
    fn validate_credentials(&self) -> Result<Arc<dyn CredentialProvider>> {
        self.credentials.clone().ok_or_else(|| {
            Error::config(
                "Credential provider is required. Use .credentials() to set it.\n\
                 Example: RealtimeClient::builder().credentials(StaticCredentials::new(token))",
            )
        })
    }

    /// Assembles the connector in preference order.
    fn validate_transports(&self) -> Result<Arc<dyn Connector>> {
        let mut connectors: Vec<Arc<dyn Connector>> = Vec::with_capacity(self.transports.len() + 1);

        if let Some(raw) = &self.url {
            let url = Url::parse(raw)?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(Error::config(format!(
                    "Realtime URL must use ws:// or wss://, got: {raw}"
                )));
            }

            connectors.push(Arc::new(
                WebSocketConnector::new(url).with_connect_timeout(self.options.connect_timeout),
            ));
        }

        connectors.extend(self.transports.iter().cloned());

        match connectors.len() {
            0 => Err(Error::config(
                "A realtime URL or transport is required. Use .url() or .transport() to set it.\n\
                 Example: RealtimeClient::builder().url(\"wss://api.example.com/realtime\")",
            )),
            1 => Ok(connectors.remove(0)),
            _ => Ok(Arc::new(FallbackConnector::new(connectors))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::credential::StaticCredentials;
    use crate::transport::MemoryConnector;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.url.is_none());
        assert!(builder.credentials.is_none());
        assert!(builder.transports.is_empty());
        assert_eq!(builder.options, ClientOptions::default());
    }

    #[test]
    fn test_build_fails_without_credentials() {
        let err = ClientBuilder::new()
            .url("ws://127.0.0.1:9000")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Credential provider"));
    }

    #[test]
    fn test_build_fails_without_endpoint() {
        let err = ClientBuilder::new()
            .credentials(StaticCredentials::new("t"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("URL or transport"));
    }

    #[test]
    fn test_build_rejects_http_url() {
        let err = ClientBuilder::new()
            .url("https://api.example.com")
            .credentials(StaticCredentials::new("t"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_rejects_garbage_url() {
        let err = ClientBuilder::new()
            .url("not a url")
            .credentials(StaticCredentials::new("t"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_build_rejects_bad_options() {
        let (connector, _acceptor) = MemoryConnector::new();
        let result = ClientBuilder::new()
            .credentials(StaticCredentials::new("t"))
            .transport(connector)
            .reconnection_attempts(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_single_transport_used_directly() {
        let (connector, _acceptor) = MemoryConnector::new();
        let client = ClientBuilder::new()
            .credentials(StaticCredentials::new("t"))
            .transport(connector)
            .build()
            .expect("build");
        assert_eq!(client.inner.connector.kind(), "memory");
    }

    #[test]
    fn test_url_plus_transport_builds_fallback() {
        let (connector, _acceptor) = MemoryConnector::new();
        let client = ClientBuilder::new()
            .url("ws://127.0.0.1:9000/realtime")
            .credentials(StaticCredentials::new("t"))
            .transport(connector)
            .build()
            .expect("build");
        assert_eq!(client.inner.connector.kind(), "fallback");
    }

    #[test]
    fn test_url_only_uses_websocket() {
        let client = ClientBuilder::new()
            .url("wss://api.example.com/realtime")
            .credentials(StaticCredentials::new("t"))
            .build()
            .expect("build");
        assert_eq!(client.inner.connector.kind(), "websocket");
        assert_eq!(client.options().reconnection_attempts, 5);
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = ClientBuilder::new().url("ws://localhost:1");
        let cloned = builder.clone();
        assert_eq!(builder.url, cloned.url);
    }
}
