//! Error types for Shoal
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for Shoal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shoal error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid identity: {identity}, reason: {reason}")]
    InvalidIdentity { identity: String, reason: String },

    #[error("Identity too long: {length} bytes exceeds limit of {limit} bytes")]
    IdentityTooLong { length: usize, limit: usize },

    #[error("Invalid kind: {kind}, reason: {reason}")]
    InvalidKind { kind: String, reason: String },

    #[error("Invalid member ID: {id}, reason: {reason}")]
    InvalidMemberId { id: String, reason: String },

    // =========================================================================
    // Remoting Errors
    // =========================================================================
    #[error("Send to {target} failed: {reason}")]
    SendFailed { target: String, reason: String },

    #[error("Remote spawn of {identity} on {activator} failed: {reason}")]
    SpawnFailed {
        identity: String,
        activator: String,
        reason: String,
    },

    // =========================================================================
    // Partition Errors
    // =========================================================================
    #[error("Partition owner for kind {kind} is not running")]
    PartitionClosed { kind: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a send failed error
    pub fn send_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote spawn failed error
    pub fn spawn_failed(
        identity: impl Into<String>,
        activator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SpawnFailed {
            identity: identity.into(),
            activator: activator.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::SendFailed { .. } | Self::SpawnFailed { .. })
    }
}
