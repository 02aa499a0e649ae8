//! Shoal Core
//!
//! Shared vocabulary for the Shoal actor-placement layer.
//!
//! # Overview
//!
//! This crate provides:
//! - Cluster identities, member descriptors, and actor locations
//! - Wire-level message and response types
//! - The remoting seam consumed by the placement layer
//! - Time abstraction, constants, and the error taxonomy

pub mod constants;
pub mod error;
pub mod identity;
pub mod io;
pub mod member;
pub mod messages;
pub mod remoting;

pub use error::{Error, Result};
pub use identity::ClusterIdentity;
pub use io::{ManualClock, TimeProvider, WallClockTime};
pub use member::{ActorLocation, Member, MemberAddress, MemberId};
pub use messages::{ActivationResponse, RemoteMessage, SpawnOutcome};
pub use remoting::Remoting;
