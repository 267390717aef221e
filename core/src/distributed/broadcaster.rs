//! The root-write-then-broadcast protocol.
//!
//! # How a point write works
//!
//! For a write of value `V` into slot `S`:
//!
//! 1.  **Inactive context**: write `V` into `S` and return. This is a plain container.
//! 2.  **Active context**:
//!     *   Root writes `V` into `S`. Every other rank drops its `V` unread.
//!     *   Every rank, root included, joins one broadcast seeded by root's `S`.
//!     *   Every rank, root included, overwrites `S` with the broadcast result.
//!
//! Root overwriting its own slot with the frame it just sent is redundant, and keeps
//! the last step identical on every rank.
//!
//! # Failure
//!
//! If the broadcast fails the call returns the error unchanged. The group state for that
//! write is undefined and the write must not be retried on its own: the other ranks may
//! already have left the collective, and a lone retry would pair with their *next* call.

use crate::distributed::backend::CollectiveBackend;
use crate::distributed::payload::Payload;
use crate::store::Result;
use tracing::{trace, warn};

/// Applies writes under root authority.
#[derive(Debug, Clone)]
pub struct Broadcaster<B> {
    backend: B,
}

impl<B: CollectiveBackend> Broadcaster<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Writes `value` into `slot` so that, on return, `slot` holds root's value on every rank.
    pub fn write<P: Payload>(&self, slot: &mut P, value: P) -> Result<()> {
        if !self.backend.is_active() {
            *slot = value;
            return Ok(());
        }

        let rank = self.backend.rank();
        if rank == self.backend.root() {
            *slot = value;
        }
        trace!(rank, root = self.backend.root(), "point write");

        self.backend.broadcast_into(slot).map_err(|err| {
            warn!(rank, error = %err, "point write broadcast failed");
            err
        })
    }

    /// Broadcasts a frame produced on root only.
    ///
    /// `encode` runs on root; every other rank contributes an empty frame.
    /// Returns root's frame on every rank. For inactive contexts `encode` still
    /// runs and its frame is returned directly.
    pub fn share<F>(&self, encode: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        if !self.backend.is_active() {
            return encode();
        }

        let rank = self.backend.rank();
        let root = self.backend.root();
        let frame = if rank == root { encode()? } else { Vec::new() };
        self.backend.broadcast_bytes(frame, root).map_err(|err| {
            warn!(rank, error = %err, "shared frame broadcast failed");
            err
        })
    }
}
