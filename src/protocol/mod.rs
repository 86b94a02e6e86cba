//! Wire protocol message types.
//!
//! This module defines the frames exchanged with the realtime server.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `Handshake` | Client → Server | Present credential and client type |
//! | `OpenAck` | Server → Client | Assign session id |
//! | `Frame` | Both | Named channel message |
//! | `Envelope` | Both | `{type, payload}` body on the generic channels |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Channel and lifecycle event names |
//! | `frame` | Frame and Envelope types |
//! | `handshake` | Handshake and OpenAck types |

// ============================================================================
// Submodules
// ============================================================================

/// Channel and lifecycle event names.
pub mod channel;

/// Frame and envelope types.
pub mod frame;

/// Handshake message types.
pub mod handshake;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{Envelope, Frame};
pub use handshake::{ClientType, Handshake, OpenAck};
