use super::backend::{CollectiveBackend, ProcessContext};
use super::config::GroupConfig;
use crate::store::{ArrayError, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, trace, warn};

/// A message travelling around the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingFrame {
    /// Root's payload, forwarded rank to rank.
    Payload(Vec<u8>),
    /// Sent by the last rank of the lap to tell root everyone has the payload.
    Arrived,
    /// Circulated by root to let every rank leave the collective.
    Release,
}

impl RingFrame {
    fn kind(&self) -> &'static str {
        match self {
            RingFrame::Payload(_) => "Payload",
            RingFrame::Arrived => "Arrived",
            RingFrame::Release => "Release",
        }
    }
}

/// An in-process collective backend.
///
/// Each rank runs on its own thread and talks only to its neighbours through
/// `crossbeam` channels: it receives from `rank - 1` and sends to `rank + 1`
/// (wrapping around), like the ring used by NCCL-style collectives.
///
/// # Broadcast
///
/// A broadcast takes three laps of the ring:
/// 1. **Payload**: root sends its frame right; every rank keeps a copy and forwards it,
///    stopping at the rank just left of root.
/// 2. **Arrived**: that last rank tells root the payload has gone all the way round.
/// 3. **Release**: root circulates a release token; a rank returns only once it has seen it.
///
/// So no rank leaves the collective before every rank holds root's frame.
#[derive(Debug, Clone)]
pub struct RingBackend {
    rank: usize,
    world_size: usize,
    left_rx: Receiver<RingFrame>,  // Receive from rank - 1
    right_tx: Sender<RingFrame>,   // Send to rank + 1
}

impl RingBackend {
    pub fn new(
        rank: usize,
        world_size: usize,
        left_rx: Receiver<RingFrame>,
        right_tx: Sender<RingFrame>,
    ) -> Self {
        Self {
            rank,
            world_size,
            left_rx,
            right_tx,
        }
    }

    /// Builds one fully wired handle per rank, in rank order.
    ///
    /// Channel `i` connects rank `i` to rank `i + 1`: rank `i` sends on it and
    /// rank `i + 1` receives on it. Move each handle onto its own thread.
    pub fn group(config: &GroupConfig) -> Result<Vec<RingBackend>> {
        config.validate()?;
        let world_size = config.world_size;

        let (txs, rxs): (Vec<_>, Vec<_>) = (0..world_size).map(|_| unbounded()).unzip();
        let mut rxs: Vec<Option<Receiver<RingFrame>>> = rxs.into_iter().map(Some).collect();

        let mut handles = Vec::with_capacity(world_size);
        for (rank, right_tx) in txs.into_iter().enumerate() {
            let left = (rank + world_size - 1) % world_size;
            let left_rx = rxs[left].take().ok_or_else(|| {
                ArrayError::InvalidConfig(format!("ring channel {left} wired twice"))
            })?;
            handles.push(RingBackend::new(rank, world_size, left_rx, right_tx));
        }

        debug!(world_size, "ring group wired");
        Ok(handles)
    }

    fn send(&self, frame: RingFrame) -> Result<()> {
        let right = (self.rank + 1) % self.world_size;
        trace!(rank = self.rank, to = right, kind = frame.kind(), "ring send");
        self.right_tx.send(frame).map_err(|_| {
            let err = ArrayError::Communication(format!(
                "rank {} could not send to rank {}: peer disconnected",
                self.rank, right
            ));
            warn!(rank = self.rank, error = %err, "ring send failed");
            err
        })
    }

    fn recv(&self) -> Result<RingFrame> {
        let left = (self.rank + self.world_size - 1) % self.world_size;
        self.left_rx.recv().map_err(|_| {
            let err = ArrayError::Communication(format!(
                "rank {} could not receive from rank {}: peer disconnected",
                self.rank, left
            ));
            warn!(rank = self.rank, error = %err, "ring recv failed");
            err
        })
    }

    fn expect_frame(&self, expected: RingFrame) -> Result<()> {
        let got = self.recv()?;
        if got != expected {
            return Err(ArrayError::Communication(format!(
                "rank {} expected {} frame, got {}",
                self.rank,
                expected.kind(),
                got.kind()
            )));
        }
        Ok(())
    }

    fn recv_payload(&self) -> Result<Vec<u8>> {
        match self.recv()? {
            RingFrame::Payload(bytes) => Ok(bytes),
            other => Err(ArrayError::Communication(format!(
                "rank {} expected Payload frame, got {}",
                self.rank,
                other.kind()
            ))),
        }
    }
}

impl ProcessContext for RingBackend {
    fn is_active(&self) -> bool {
        true
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }
}

impl CollectiveBackend for RingBackend {
    fn broadcast_bytes(&self, frame: Vec<u8>, root: usize) -> Result<Vec<u8>> {
        if root >= self.world_size {
            return Err(ArrayError::Communication(format!(
                "root {} outside group of {}",
                root, self.world_size
            )));
        }
        if self.world_size == 1 {
            return Ok(frame);
        }

        // The rank just left of root ends the payload lap.
        let last = (root + self.world_size - 1) % self.world_size;

        // --- Lap 1: Payload ---
        let payload = if self.rank == root {
            self.send(RingFrame::Payload(frame.clone()))?;
            frame
        } else {
            let bytes = self.recv_payload()?;
            if self.rank != last {
                self.send(RingFrame::Payload(bytes.clone()))?;
            }
            bytes
        };

        // --- Lap 2: Arrived ---
        if self.rank == last {
            self.send(RingFrame::Arrived)?;
        }

        // --- Lap 3: Release ---
        if self.rank == root {
            self.expect_frame(RingFrame::Arrived)?;
            self.send(RingFrame::Release)?;
            self.expect_frame(RingFrame::Release)?;
        } else {
            self.expect_frame(RingFrame::Release)?;
            self.send(RingFrame::Release)?;
        }

        Ok(payload)
    }
}
