//! Credential provider interface.
//!
//! The client asks a [`CredentialProvider`] for a short-lived access token
//! before every manual `connect`. The provider is usually a thin wrapper over
//! the platform's HTTP API; this crate only defines the seam.
//!
//! The response mirrors the API's JSON:
//!
//! ```json
//! { "success": true, "data": { "accessToken": "..." } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// CredentialResponse
// ============================================================================

/// Token payload of a credential response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    /// Short-lived access token.
    pub access_token: String,
}

impl fmt::Debug for TokenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenData")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Result of a credential request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponse {
    /// Whether the API call succeeded.
    pub success: bool,

    /// Token payload, present on success.
    #[serde(default)]
    pub data: Option<TokenData>,
}

impl CredentialResponse {
    /// Creates a successful response carrying `access_token`.
    #[inline]
    #[must_use]
    pub fn ok(access_token: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(TokenData {
                access_token: access_token.into(),
            }),
        }
    }

    /// Creates a non-success response.
    #[inline]
    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            data: None,
        }
    }

    /// Extracts the access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CredentialUnavailable`] on non-success, missing data,
    /// or an empty token.
    pub fn into_token(self) -> Result<String> {
        if !self.success {
            return Err(Error::credential_unavailable("provider reported failure"));
        }

        match self.data {
            Some(TokenData { access_token }) if !access_token.is_empty() => Ok(access_token),
            Some(_) => Err(Error::credential_unavailable("empty access token")),
            None => Err(Error::credential_unavailable("response carried no token")),
        }
    }
}

// ============================================================================
// CredentialProvider
// ============================================================================

/// Supplies short-lived access tokens on demand.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Requests a fresh token.
    ///
    /// # Errors
    ///
    /// Any error aborts the `connect` call as
    /// [`Error::CredentialUnavailable`].
    async fn fetch(&self) -> Result<CredentialResponse>;
}

// ============================================================================
// StaticCredentials
// ============================================================================

/// Provider returning the same token every time.
#[derive(Clone)]
pub struct StaticCredentials {
    access_token: String,
}

impl StaticCredentials {
    /// Creates a provider for a fixed token.
    #[inline]
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn fetch(&self) -> Result<CredentialResponse> {
        Ok(CredentialResponse::ok(self.access_token.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================
