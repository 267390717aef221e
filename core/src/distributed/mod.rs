//! # Process Groups & Root-Authoritative Writes
//!
//! This module is where a local array becomes a *distributed* one.
//!
//! ## 🎓 The "Why"
//!
//! Imagine four people each keeping their own copy of a shared spreadsheet. Nobody can see
//! anyone else's copy. To keep them identical, they agree on a rule: **whenever a cell is
//! written, whatever person 0 wrote is read aloud, and everybody copies it down.** What the
//! other three wanted to write is ignored.
//!
//! That rule is the whole protocol:
//! *   Every participant (a **rank**) runs the same program on its own private data (SPMD).
//! *   Rank 0 is the **root**, the single source of truth.
//! *   Every point write is followed by a **broadcast** of root's value to every rank.
//!
//! The price is that every rank must perform the same writes in the same order. A broadcast
//! is a **collective**: it only completes when every rank has joined it. A rank that skips a
//! write leaves the others waiting forever; nothing here can detect that.
//!
//! ## 📦 Module Contents
//!
//! *   [`ProcessContext`](backend::ProcessContext) / [`CollectiveBackend`](backend::CollectiveBackend):
//!     the interface to the group. Two implementations ship:
//!     *   [`SingleProcess`](backend::SingleProcess): no group, arrays act as plain containers.
//!     *   [`RingBackend`](cpu_backend::RingBackend): one thread per rank, wired as a ring of channels.
//! *   [`Payload`](payload::Payload): how a value becomes a broadcast frame, including nested arrays.
//! *   [`Broadcaster`](broadcaster::Broadcaster): the root-write-then-broadcast protocol itself.
//! *   [`GroupConfig`](config::GroupConfig): how many ranks a ring has.

pub mod backend;
pub mod broadcaster;
pub mod config;
pub mod cpu_backend;
pub mod payload;
