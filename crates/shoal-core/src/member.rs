//! Cluster member descriptors
//!
//! TigerStyle: Immutable member records, validated identifiers.
//!
//! A `Member` is replaced wholesale on topology updates, never mutated in
//! place. Member IDs are supplied by the external membership source and are
//! stable per process instance.

use crate::constants::{CLUSTER_MEMBERS_COUNT_MAX, MEMBER_ID_LENGTH_BYTES_MAX};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a cluster member
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    /// Create a new MemberId with validation
    ///
    /// # Errors
    /// Returns error if id is empty, too long, or contains invalid characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::InvalidMemberId {
                id,
                reason: "member ID cannot be empty".into(),
            });
        }

        if id.len() > MEMBER_ID_LENGTH_BYTES_MAX {
            return Err(Error::InvalidMemberId {
                id: id.clone(),
                reason: format!(
                    "member ID length {} exceeds limit {}",
                    id.len(),
                    MEMBER_ID_LENGTH_BYTES_MAX
                ),
            });
        }

        let valid = id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');

        if !valid {
            return Err(Error::InvalidMemberId {
                id,
                reason: "member ID contains invalid characters".into(),
            });
        }

        Ok(Self(id))
    }

    /// Get the member ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Network address of a member ("host:port")
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemberAddress(String);

impl MemberAddress {
    /// Create an address from host and port
    pub fn new(host: &str, port: u16) -> Self {
        debug_assert!(!host.is_empty(), "host must not be empty");
        Self(format!("{}:{}", host, port))
    }

    /// Get the address as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MemberAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Information about a cluster member
///
/// Immutable once constructed; a new incarnation of the same process arrives
/// as a fresh `Member` in the next topology snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique member identifier
    pub id: MemberId,
    /// Host name or IP
    pub host: String,
    /// Port
    pub port: u16,
    /// Actor kinds this member can host
    pub kinds: Vec<String>,
}

impl Member {
    /// Create a new member descriptor
    pub fn new(
        id: MemberId,
        host: impl Into<String>,
        port: u16,
        kinds: Vec<String>,
    ) -> Self {
        let host = host.into();
        debug_assert!(!host.is_empty(), "host must not be empty");

        Self {
            id,
            host,
            port,
            kinds,
        }
    }

    /// Derived network address ("host:port")
    pub fn address(&self) -> MemberAddress {
        MemberAddress::new(&self.host, self.port)
    }

    /// Check whether this member hosts the given kind
    pub fn serves_kind(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }
}

/// Location of a concrete actor instance: member address plus local actor name
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActorLocation {
    /// Address of the hosting member
    pub address: MemberAddress,
    /// Actor name local to that member
    pub actor: String,
}

impl ActorLocation {
    /// Create a new actor location
    pub fn new(address: MemberAddress, actor: impl Into<String>) -> Self {
        let actor = actor.into();
        debug_assert!(!actor.is_empty(), "actor name must not be empty");
        Self { address, actor }
    }
}

impl fmt::Display for ActorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.actor)
    }
}

/// Compile-time assertion for cluster limit
const _: () = {
    assert!(CLUSTER_MEMBERS_COUNT_MAX >= 1);
    assert!(CLUSTER_MEMBERS_COUNT_MAX <= 10_000);
};

#[cfg(test)]
mod tests {
    use super::*;

    fn test_member() -> Member {
        Member::new(
            MemberId::new("m1").unwrap(),
            "127.0.0.1",
            8000,
            vec!["greeter".into(), "worker".into()],
        )
    }

    #[test]
    fn test_member_id_valid() {
        let id = MemberId::new("member-1").unwrap();
        assert_eq!(id.as_str(), "member-1");
    }

    #[test]
    fn test_member_id_invalid() {
        assert!(matches!(
            MemberId::new(""),
            Err(Error::InvalidMemberId { .. })
        ));
        assert!(matches!(
            MemberId::new("m/1"),
            Err(Error::InvalidMemberId { .. })
        ));
        let long = "a".repeat(MEMBER_ID_LENGTH_BYTES_MAX + 1);
        assert!(matches!(
            MemberId::new(long),
            Err(Error::InvalidMemberId { .. })
        ));
    }

    #[test]
    fn test_member_address() {
        let member = test_member();
        assert_eq!(member.address().as_str(), "127.0.0.1:8000");
    }

    #[test]
    fn test_member_serves_kind() {
        let member = test_member();
        assert!(member.serves_kind("greeter"));
        assert!(member.serves_kind("worker"));
        assert!(!member.serves_kind("mailer"));
    }

    #[test]
    fn test_actor_location_display() {
        let location = ActorLocation::new(MemberAddress::new("127.0.0.1", 8000), "alice");
        assert_eq!(location.to_string(), "127.0.0.1:8000/alice");
    }

    #[test]
    fn test_actor_location_hashable() {
        use std::collections::HashMap;
        let location = ActorLocation::new(MemberAddress::new("h", 1), "a");
        let mut map = HashMap::new();
        map.insert(location.clone(), "x");
        assert_eq!(map.get(&location), Some(&"x"));
    }
}
