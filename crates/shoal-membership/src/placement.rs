//! Rendezvous placement
//!
//! Deterministic highest-random-weight selection of the member that owns an
//! identity. Every member computes the same answer from the same membership
//! view without coordination, which is why partition rebalancing is driven
//! strictly by registry topology events.

use shoal_core::member::{Member, MemberAddress};

/// Selects the owning member for an identity
pub struct RendezvousHasher;

impl RendezvousHasher {
    /// Choose the member with the highest hash score for `identity`
    ///
    /// Returns `None` when `members` is empty. Ties (vanishingly rare) break
    /// on address ordering so all members still agree.
    pub fn owner_for(members: &[Member], identity: &str) -> Option<MemberAddress> {
        members
            .iter()
            .map(|m| (m.address(), Self::score(m.address().as_str(), identity)))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())))
            .map(|(address, _)| address)
    }

    /// FNV-style mixing over identity then address bytes
    fn score(address: &str, identity: &str) -> u64 {
        let mut hash = 0xcbf29ce484222325u64;
        for b in identity.as_bytes().iter().chain(address.as_bytes()) {
            hash ^= u64::from(*b);
            hash = hash.wrapping_mul(0x100000001b3);
            hash ^= hash >> 32;
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::member::MemberId;

    fn member(n: u32) -> Member {
        Member::new(
            MemberId::new(format!("m{}", n)).unwrap(),
            "127.0.0.1",
            8000 + n as u16,
            vec!["greeter".into()],
        )
    }

    #[test]
    fn test_empty_members() {
        assert_eq!(RendezvousHasher::owner_for(&[], "alice"), None);
    }

    #[test]
    fn test_single_member() {
        let members = vec![member(1)];
        assert_eq!(
            RendezvousHasher::owner_for(&members, "alice"),
            Some(members[0].address())
        );
    }

    #[test]
    fn test_deterministic_and_order_independent() {
        let mut members = vec![member(1), member(2), member(3)];
        let owner = RendezvousHasher::owner_for(&members, "alice");

        members.reverse();
        assert_eq!(RendezvousHasher::owner_for(&members, "alice"), owner);
        assert_eq!(RendezvousHasher::owner_for(&members, "alice"), owner);
    }

    #[test]
    fn test_spreads_identities() {
        let members = vec![member(1), member(2), member(3), member(4)];
        let mut seen = std::collections::HashSet::new();
        for i in 0..64 {
            let owner = RendezvousHasher::owner_for(&members, &format!("id-{}", i)).unwrap();
            seen.insert(owner);
        }
        // With 64 identities over 4 members every member should own some.
        assert_eq!(seen.len(), members.len());
    }

    #[test]
    fn test_minimal_reshuffle_on_removal() {
        let members = vec![member(1), member(2), member(3)];
        let before: Vec<_> = (0..32)
            .map(|i| RendezvousHasher::owner_for(&members, &format!("id-{}", i)).unwrap())
            .collect();

        let removed = member(2).address();
        let remaining: Vec<_> = members
            .iter()
            .filter(|m| m.address() != removed)
            .cloned()
            .collect();

        for (i, owner) in before.iter().enumerate() {
            let after = RendezvousHasher::owner_for(&remaining, &format!("id-{}", i)).unwrap();
            // Identities not owned by the removed member must not move.
            if *owner != removed {
                assert_eq!(after, *owner);
            }
        }
    }
}
