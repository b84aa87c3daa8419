//! Storage contract for IPALA.
//!
//! This crate defines the ordered byte-key store the keeper writes to and the
//! pieces needed to execute transactions against it deterministically:
//! - `KvRead` / `KvStore`: ordered get/set/delete plus range scans
//! - `MemStore`: `BTreeMap` reference backend with a BLAKE3 state digest
//! - `CacheStore`: write-buffering branch, committed or dropped as a unit
//! - `PrefixRead` / `PrefixStore`: per-module key namespaces
//! - `Context`: block header, event sink and atomic-branch helper
//!
//! Merkle proofs and persistence belong to the host chain, not here.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod cache;
mod context;
mod kv;
mod mem;
mod prefix;

pub use cache::CacheStore;
pub use context::{BlockHeader, Context, Event, EventAttribute};
pub use kv::{inclusive_end_bytes, prefix_end_bytes, KvPair, KvRead, KvStore};
pub use mem::MemStore;
pub use prefix::{PrefixRead, PrefixStore};
