//! # smallpool-core
//!
//! Pool allocator engine for short-lived, small, fixed-size-class objects.
//!
//! Three tiers: a chunk is one contiguous slab cut into equal blocks
//! chained through an intrusive free list; a [`FixedAllocator`] pools chunks
//! of one block size with last-used caches for allocation and deallocation;
//! a [`SmallObjectAllocator`] dispatches requests to the right class by
//! rounded-up size and forwards anything larger to the system heap.
//!
//! The engine is single-threaded: every operation assumes exclusive
//! access. Wrap the allocator in a lock to share it (the
//! `smallpool` façade crate does exactly that for its process-wide
//! instance).

#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

mod chunk;
pub mod config;
pub mod fixed;
pub mod log;
pub mod size_class;
pub mod small_object;

pub use config::{ConfigError, PoolConfig};
pub use fixed::{DeallocOutcome, FixedAllocator};
pub use log::{PoolLogLevel, PoolLogRecord};
pub use small_object::{PoolStats, SmallObjectAllocator};

use thiserror::Error;

/// Failures surfaced by the allocation paths.
///
/// A failed allocation leaves the allocator state consistent and unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Acquiring a chunk slab from the heap failed.
    #[error("chunk slab allocation of {bytes} bytes failed")]
    SlabAllocation { bytes: usize },
    /// The system heap refused a large-object request.
    #[error("system allocation of {bytes} bytes failed")]
    SystemAllocation { bytes: usize },
    /// The size/alignment combination cannot be represented as a layout.
    #[error("{bytes} bytes with alignment {align} is not a representable layout")]
    InvalidLayout { bytes: usize, align: usize },
}
