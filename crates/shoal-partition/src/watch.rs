//! Termination-watch seam
//!
//! The underlying actor runtime owns supervision; Shoal only needs to know
//! when an actor it placed terminates. A watch carries the owner's mailbox
//! so the notification lands in the same sequential processing queue as
//! every other partition operation.

use crate::messages::PartitionMessage;
use async_trait::async_trait;
use shoal_core::member::ActorLocation;
use tokio::sync::mpsc;

/// Sender half of a partition owner's mailbox
pub type OwnerMailbox = mpsc::Sender<PartitionMessage>;

/// Watch seam into the local actor runtime
#[async_trait]
pub trait ActorWatch: Send + Sync {
    /// Watch `location`; on termination the runtime delivers
    /// [`PartitionMessage::Terminated`] to `mailbox`
    async fn watch(&self, location: &ActorLocation, mailbox: OwnerMailbox);

    /// Stop watching `location` for the owner behind `mailbox`
    async fn unwatch(&self, location: &ActorLocation, mailbox: &OwnerMailbox);
}
