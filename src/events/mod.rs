//! Publish/subscribe plumbing.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ListenerRegistry`] | Event type to ordered listener list |
//! | [`Subscription`] | Handle removing one registration |
//! | [`Router`] | Resolves inbound frames and dispatches them |

// ============================================================================
// Submodules
// ============================================================================

/// Listener registry.
pub mod registry;

/// Inbound frame routing.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::{Listener, ListenerRegistry, Subscription};
pub use router::{Inbound, Router};
