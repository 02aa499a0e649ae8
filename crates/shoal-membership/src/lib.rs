//! Shoal Membership
//!
//! Membership tracking and placement policy for Shoal clusters.
//!
//! # Overview
//!
//! This crate provides:
//! - The member registry (topology diffing, banned set, leader tracking)
//! - Per-kind member strategies and the rendezvous placement function
//! - The bounded-wait reader/writer lock guarding registry state
//! - The cluster event stream and the remote-location cache

pub mod cache;
pub mod events;
pub mod lock;
pub mod placement;
pub mod registry;
pub mod strategy;

pub use cache::LocationCache;
pub use events::{ClusterEvent, ClusterTopology, EventStream};
pub use lock::{BoundedRwLock, LockConfig};
pub use placement::RendezvousHasher;
pub use registry::{BannedMemberSink, LeaderInfo, MemberRegistry, RegistryConfig};
pub use strategy::{round_robin_factory, MemberStrategy, RoundRobinStrategy, StrategyFactory};
