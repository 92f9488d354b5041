//! Commerce error types.

use thiserror::Error;

/// Errors that can occur at the cart's persistence boundary.
///
/// Cart mutations themselves never fail; malformed input is treated as
/// a no-op. Errors only arise when talking to the host's durable
/// storage.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Failed to serialize or deserialize persisted cart state.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host storage backend failed.
    #[error("Storage operation failed: {0}")]
    Storage(String),
}
