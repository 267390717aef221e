use crate::distributed::payload::Payload;
use crate::store::Result;
use std::fmt::Debug;
use tracing::trace;

/// The rank every group treats as source of truth.
pub const ROOT: usize = 0;

/// Where this participant sits in its process group.
///
/// Injected into arrays rather than read from global state, so a test can hand an
/// array a [`SingleProcess`] context (or any fake) without a real group.
pub trait ProcessContext {
    /// Returns `true` if a multi-participant group is coordinating this array.
    fn is_active(&self) -> bool;

    /// Returns the rank of the current participant.
    fn rank(&self) -> usize;

    /// Returns the total number of participants.
    fn world_size(&self) -> usize;

    /// Returns the root rank. Always [`ROOT`].
    fn root(&self) -> usize {
        ROOT
    }

    fn is_root(&self) -> bool {
        self.rank() == self.root()
    }
}

/// Abstraction for a collective communication backend.
///
/// This trait allows swapping between different transports:
/// - **Ring**: [`RingBackend`](crate::distributed::cpu_backend::RingBackend), threads wired with channels.
/// - **Single process**: [`SingleProcess`], no communication at all.
///
/// A backend handle is cloned into every array (and every nested array) of its rank.
pub trait CollectiveBackend: ProcessContext + Clone + Debug + Send + Sync {
    /// Broadcasts `frame` from `root` to every participant.
    ///
    /// Every participant must call this, in the same order relative to its other
    /// collective calls. Only root's `frame` is read; the others may pass an empty one.
    /// Returns root's frame on every rank once the whole group has received it.
    fn broadcast_bytes(&self, frame: Vec<u8>, root: usize) -> Result<Vec<u8>>;

    /// Overwrites `slot` on every rank with root's value of `slot`.
    ///
    /// Root's own slot is overwritten too, with the frame it just sent.
    fn broadcast_into<P: Payload + ?Sized>(&self, slot: &mut P) -> Result<()> {
        let root = self.root();
        let frame = if self.rank() == root {
            slot.encode()?
        } else {
            Vec::new()
        };
        let received = self.broadcast_bytes(frame, root)?;
        trace!(
            rank = self.rank(),
            root,
            bytes = received.len(),
            "broadcast received"
        );
        slot.assign_encoded(&received)
    }
}

/// The context of a program running without any process group.
///
/// Arrays built on it behave exactly like plain local containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleProcess;

impl ProcessContext for SingleProcess {
    fn is_active(&self) -> bool {
        false
    }

    fn rank(&self) -> usize {
        ROOT
    }

    fn world_size(&self) -> usize {
        1
    }
}

impl CollectiveBackend for SingleProcess {
    fn broadcast_bytes(&self, frame: Vec<u8>, _root: usize) -> Result<Vec<u8>> {
        Ok(frame)
    }
}
