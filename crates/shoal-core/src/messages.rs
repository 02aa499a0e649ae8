//! Wire-level message types
//!
//! TigerStyle: Closed tagged unions; a response is never malformed because
//! the variant shape carries exactly the data that status allows.

use crate::identity::ClusterIdentity;
use crate::member::ActorLocation;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Response to an actor PID request
///
/// `Ok` always carries exactly one location. Failures carry no location and
/// are never retried by the partition owner itself; the caller decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActivationResponse {
    /// Actor is (now) registered at this location
    Ok { location: ActorLocation },
    /// No activator currently exists for the requested kind
    Unavailable,
    /// Remote spawn did not complete in time (outcome ambiguous)
    Timeout,
    /// Remote spawn failed definitively
    Error,
}

impl ActivationResponse {
    /// Create an OK response
    pub fn ok(location: ActorLocation) -> Self {
        Self::Ok { location }
    }

    /// Check if this is a successful response
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Get the location if this response carries one
    pub fn location(&self) -> Option<&ActorLocation> {
        match self {
            Self::Ok { location } => Some(location),
            _ => None,
        }
    }
}

/// Outcome of a remote spawn request, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Actor was spawned at this location
    Ok(ActorLocation),
    /// The spawn did not complete within the configured timeout
    Timeout,
    /// The spawn failed definitively
    Error(String),
}

/// Messages carried between members by the remoting layer
///
/// The wire codec itself is out of scope; implementations of [`Remoting`]
/// decide how these are encoded.
///
/// [`Remoting`]: crate::remoting::Remoting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteMessage {
    /// Ownership transfer: the receiver must re-validate ownership before
    /// accepting, which makes delivery to a stale target safe.
    TakeOwnership {
        identity: ClusterIdentity,
        location: ActorLocation,
    },
    /// Opaque payload for the well-known event-stream actor on a member
    Event { payload: Bytes },
}

impl RemoteMessage {
    /// Get the identity if this message concerns one
    pub fn identity(&self) -> Option<&ClusterIdentity> {
        match self {
            Self::TakeOwnership { identity, .. } => Some(identity),
            Self::Event { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberAddress;

    fn test_location() -> ActorLocation {
        ActorLocation::new(MemberAddress::new("127.0.0.1", 8000), "alice#1")
    }

    #[test]
    fn test_activation_response_ok() {
        let response = ActivationResponse::ok(test_location());
        assert!(response.is_ok());
        assert_eq!(response.location(), Some(&test_location()));
    }

    #[test]
    fn test_activation_response_failures_carry_no_location() {
        assert_eq!(ActivationResponse::Unavailable.location(), None);
        assert_eq!(ActivationResponse::Timeout.location(), None);
        assert_eq!(ActivationResponse::Error.location(), None);
    }

    #[test]
    fn test_remote_message_identity() {
        let identity = ClusterIdentity::new("greeter", "alice").unwrap();
        let msg = RemoteMessage::TakeOwnership {
            identity: identity.clone(),
            location: test_location(),
        };
        assert_eq!(msg.identity(), Some(&identity));

        let event = RemoteMessage::Event {
            payload: Bytes::from_static(b"hello"),
        };
        assert!(event.identity().is_none());
    }
}
