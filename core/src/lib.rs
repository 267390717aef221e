//! # rootcast
//!
//! `rootcast` provides arrays that a group of cooperating participants keep identical by a
//! single rule: **on every point write, root's value wins and is broadcast to everyone**.
//!
//! Each participant (rank) runs the same program and holds a private copy of the array.
//! Reads are purely local. Writes go through a root-authoritative broadcast, so after a write
//! returns every rank holds exactly the value rank 0 wrote, whatever the others passed.
//!
//! ## Modules
//!
//! - [`store`]: Local backing stores (`Dense`, `Vec`) and the error type.
//! - [`distributed`]: Process context, collective backends and the broadcast protocol.
//! - [`array`]: The `DistributedArray` facade and its growth operations.
//!
//! ## Example
//!
//! ```rust
//! use rootcast::array::DistributedVector;
//! use rootcast::distributed::backend::ProcessContext;
//! use rootcast::distributed::config::GroupConfig;
//! use rootcast::distributed::cpu_backend::RingBackend;
//! use std::thread;
//!
//! let handles: Vec<_> = RingBackend::group(&GroupConfig::new(3))
//!     .unwrap()
//!     .into_iter()
//!     .map(|backend| {
//!         thread::spawn(move || {
//!             let rank = backend.rank();
//!             let mut v = DistributedVector::<i32, _>::zeros([4], backend);
//!             // Every rank proposes a different value; root's wins.
//!             v.set([2], if rank == 0 { 10 } else { 99 }).unwrap();
//!             v[2]
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), 10);
//! }
//! ```

pub mod array;
pub mod distributed;
pub mod store;

pub use array::{DistributedArray, DistributedMatrix, DistributedVector};
pub use distributed::backend::{CollectiveBackend, ProcessContext, SingleProcess, ROOT};
pub use store::{ArrayError, BackingStore, Dense, Element, GrowableStore, IndexStyle, Result};
