//! Cluster identity
//!
//! TigerStyle: Explicit types, assertions, validated construction.

use crate::constants::{IDENTITY_LENGTH_BYTES_MAX, KIND_LENGTH_BYTES_MAX};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a single virtual actor within the cluster
///
/// An identity is location-independent: the pair (kind, identity) names the
/// same logical actor regardless of which member currently hosts it.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    kind: String,
    identity: String,
}

impl ClusterIdentity {
    /// Create a new ClusterIdentity with validation
    ///
    /// # Errors
    /// Returns error if kind or identity is empty, exceeds length limits, or
    /// contains invalid characters.
    pub fn new(kind: impl Into<String>, identity: impl Into<String>) -> Result<Self> {
        let kind = kind.into();
        let identity = identity.into();

        if kind.is_empty() {
            return Err(Error::InvalidKind {
                kind,
                reason: "kind must not be empty".into(),
            });
        }

        if kind.len() > KIND_LENGTH_BYTES_MAX {
            return Err(Error::InvalidKind {
                kind: kind.clone(),
                reason: format!(
                    "kind length {} exceeds limit {}",
                    kind.len(),
                    KIND_LENGTH_BYTES_MAX
                ),
            });
        }

        if identity.is_empty() {
            return Err(Error::InvalidIdentity {
                identity,
                reason: "identity must not be empty".into(),
            });
        }

        if identity.len() > IDENTITY_LENGTH_BYTES_MAX {
            return Err(Error::IdentityTooLong {
                length: identity.len(),
                limit: IDENTITY_LENGTH_BYTES_MAX,
            });
        }

        // Validate characters (alphanumeric, dash, underscore, dot)
        let valid_chars = |s: &str| {
            s.chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        };

        if !valid_chars(&kind) {
            return Err(Error::InvalidKind {
                kind,
                reason: "kind contains invalid characters".into(),
            });
        }

        if !valid_chars(&identity) {
            return Err(Error::InvalidIdentity {
                identity,
                reason: "identity contains invalid characters".into(),
            });
        }

        Ok(Self { kind, identity })
    }

    /// Create a ClusterIdentity without validation (for internal use only)
    ///
    /// # Safety
    /// Caller must ensure kind and identity are valid.
    #[doc(hidden)]
    pub fn new_unchecked(kind: String, identity: String) -> Self {
        debug_assert!(!kind.is_empty() && kind.len() <= KIND_LENGTH_BYTES_MAX);
        debug_assert!(!identity.is_empty() && identity.len() <= IDENTITY_LENGTH_BYTES_MAX);
        Self { kind, identity }
    }

    /// Get the kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Get the identity
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_valid() {
        let id = ClusterIdentity::new("greeter", "alice").unwrap();
        assert_eq!(id.kind(), "greeter");
        assert_eq!(id.identity(), "alice");
        assert_eq!(id.to_string(), "greeter/alice");
    }

    #[test]
    fn test_identity_empty_rejected() {
        assert!(matches!(
            ClusterIdentity::new("", "alice"),
            Err(Error::InvalidKind { .. })
        ));
        assert!(matches!(
            ClusterIdentity::new("greeter", ""),
            Err(Error::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn test_identity_invalid_chars() {
        assert!(matches!(
            ClusterIdentity::new("greeter", "alice/bob"),
            Err(Error::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn test_identity_too_long() {
        let long = "a".repeat(IDENTITY_LENGTH_BYTES_MAX + 1);
        assert!(matches!(
            ClusterIdentity::new("greeter", long),
            Err(Error::IdentityTooLong { .. })
        ));
    }

    #[test]
    fn test_identity_equality() {
        let a = ClusterIdentity::new("greeter", "alice").unwrap();
        let b = ClusterIdentity::new("greeter", "alice").unwrap();
        let c = ClusterIdentity::new("worker", "alice").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
