//! # smallpool
//!
//! Small-object pool allocator: a memory manager that serves frequent
//! allocation and deallocation of short-lived, small objects faster than the
//! general-purpose heap, with lower fragmentation. Objects are grouped into
//! fixed size classes backed by slabs of pooled blocks; anything larger than
//! the configured maximum goes straight to the system heap.
//!
//! This crate re-exports the engine from `smallpool-core` and adds the lazy
//! process-wide instance behind a mutex; see [`global_pool`].

#![deny(unsafe_code)]

pub mod global;

pub use global::{global_pool, global_pool_with};
pub use smallpool_core::{
    ConfigError, DeallocOutcome, FixedAllocator, PoolConfig, PoolError, PoolLogLevel,
    PoolLogRecord, PoolStats, SmallObjectAllocator,
};
