//! Size-class dispatch over a vector of fixed allocators.
//!
//! The `SmallObjectAllocator` rounds each request up to a size class and
//! delegates to the class's [`FixedAllocator`]. Requests above the configured
//! maximum bypass the pool entirely and go to the system heap; zero-byte
//! requests allocate nothing and yield a null pointer.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use serde::Serialize;

use crate::config::PoolConfig;
use crate::fixed::FixedAllocator;
use crate::log::{PoolLogLevel, PoolLogRecord};
use crate::size_class;
use crate::{ConfigError, PoolError};

/// Alignment of system-heap allocations made on the large-object path.
const LARGE_OBJECT_ALIGN: usize = 16;

/// Counter snapshot across the whole pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of size classes.
    pub classes: usize,
    /// Chunks currently owned across all classes.
    pub chunks: usize,
    /// Blocks currently handed out across all classes.
    pub outstanding_blocks: usize,
    /// Free blocks across all classes.
    pub free_blocks: usize,
    /// Successful pooled allocations since construction.
    pub pool_allocs: u64,
    /// Pooled deallocations since construction.
    pub pool_deallocs: u64,
    /// Large-object allocations since construction.
    pub large_allocs: u64,
    /// Large-object deallocations since construction.
    pub large_deallocs: u64,
}

/// Pool allocator for objects up to `config.max_object_size` bytes.
///
/// One [`FixedAllocator`] per size class; class `i` serves requests in
/// `(i * alignment, (i + 1) * alignment]`. All operations assume exclusive
/// access; the allocator is not reentrant.
#[derive(Debug)]
pub struct SmallObjectAllocator {
    config: PoolConfig,
    pool: Vec<FixedAllocator>,
    lifecycle_logs: Vec<PoolLogRecord>,
    next_decision_id: u64,
    pool_allocs: u64,
    pool_deallocs: u64,
    large_allocs: u64,
    large_deallocs: u64,
}

impl SmallObjectAllocator {
    /// Builds a pool from `config`.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let count = size_class::class_count(config.max_object_size, config.alignment);
        let pool = (0..count)
            .map(|i| {
                FixedAllocator::new(size_class::class_size(i, config.alignment), config.chunk_size)
            })
            .collect();

        Ok(Self {
            config,
            pool,
            lifecycle_logs: Vec::new(),
            next_decision_id: 1,
            pool_allocs: 0,
            pool_deallocs: 0,
            large_allocs: 0,
            large_deallocs: 0,
        })
    }

    /// Builds a pool with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PoolConfig::default()).expect("default configuration is valid")
    }

    /// Allocates `bytes` bytes.
    ///
    /// Zero bytes yields a null pointer without allocating. Requests above
    /// `max_object_size` are served by the system heap and are not tracked
    /// by the pool. Pooled pointers stay valid until deallocated or until
    /// the allocator is dropped, whichever comes first.
    pub fn allocate(&mut self, bytes: usize) -> Result<*mut u8, PoolError> {
        if bytes == 0 {
            self.record(
                PoolLogLevel::Trace,
                "allocate",
                "zero_size",
                None,
                Some(0),
                None,
                "noop",
                String::new(),
            );
            return Ok(ptr::null_mut());
        }

        if bytes > self.config.max_object_size {
            return self.allocate_large(bytes);
        }

        let index = size_class::class_index(bytes, self.config.alignment);
        debug_assert!(index < self.pool.len());

        match self.pool[index].allocate() {
            Ok(block) => {
                self.pool_allocs += 1;
                self.record(
                    PoolLogLevel::Trace,
                    "allocate",
                    "pool_alloc",
                    Some(block.as_ptr() as usize),
                    Some(bytes),
                    Some(index),
                    "success",
                    format!("block_size={}", self.pool[index].block_size()),
                );
                Ok(block.as_ptr())
            }
            Err(err) => {
                self.record(
                    PoolLogLevel::Warn,
                    "allocate",
                    "pool_alloc",
                    None,
                    Some(bytes),
                    Some(index),
                    "oom",
                    err.to_string(),
                );
                Err(err)
            }
        }
    }

    /// Releases a block of known size.
    ///
    /// Null pointers and zero sizes are no-ops. The corrected symmetric
    /// dispatch: large blocks go back to the system heap and the call
    /// returns, everything else is routed to its size class.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`SmallObjectAllocator::allocate`]
    /// on this allocator with the same `bytes`, and must not have been freed
    /// since.
    pub unsafe fn deallocate(&mut self, ptr: *mut u8, bytes: usize) {
        let Some(block) = NonNull::new(ptr) else {
            self.record(
                PoolLogLevel::Trace,
                "deallocate",
                "null_free",
                Some(0),
                Some(bytes),
                None,
                "noop",
                String::new(),
            );
            return;
        };
        if bytes == 0 {
            self.record(
                PoolLogLevel::Trace,
                "deallocate",
                "zero_size",
                Some(ptr as usize),
                Some(0),
                None,
                "noop",
                String::new(),
            );
            return;
        }

        if bytes > self.config.max_object_size {
            let layout = large_layout(bytes).expect("layout was valid at allocation");
            // SAFETY: per the caller contract, ptr came from allocate(bytes)
            // on the large-object path, which used this exact layout.
            unsafe {
                std::alloc::dealloc(ptr, layout);
            }
            self.large_deallocs += 1;
            self.record(
                PoolLogLevel::Trace,
                "deallocate",
                "large_free",
                Some(ptr as usize),
                Some(bytes),
                None,
                "success",
                String::new(),
            );
            return;
        }

        let index = size_class::class_index(bytes, self.config.alignment);
        debug_assert!(index < self.pool.len());
        let outcome = self.pool[index].deallocate(block);
        self.pool_deallocs += 1;
        self.record(
            PoolLogLevel::Trace,
            "deallocate",
            "pool_free",
            Some(ptr as usize),
            Some(bytes),
            Some(index),
            outcome.as_str(),
            String::new(),
        );
    }

    /// Releases a block whose size is unknown.
    ///
    /// Scans every size class for the owning chunk; a hit is routed to that
    /// class's allocator. A miss is a no-op: a pointer the pool does not own
    /// came from the system heap, and without its size there is no layout to
    /// release it with. This path is a correctness fallback, linear in the
    /// total number of chunks.
    pub fn deallocate_unsized(&mut self, ptr: *mut u8) {
        let Some(block) = NonNull::new(ptr) else {
            self.record(
                PoolLogLevel::Trace,
                "deallocate_unsized",
                "null_free",
                Some(0),
                None,
                None,
                "noop",
                String::new(),
            );
            return;
        };

        match self.pool.iter().position(|fa| fa.has_block(block).is_some()) {
            Some(index) => {
                let outcome = self.pool[index].deallocate(block);
                self.pool_deallocs += 1;
                self.record(
                    PoolLogLevel::Trace,
                    "deallocate_unsized",
                    "pool_free",
                    Some(ptr as usize),
                    None,
                    Some(index),
                    outcome.as_str(),
                    String::new(),
                );
            }
            None => {
                self.record(
                    PoolLogLevel::Info,
                    "deallocate_unsized",
                    "unknown_pointer",
                    Some(ptr as usize),
                    None,
                    None,
                    "noop",
                    "pointer not owned by any size class".to_owned(),
                );
            }
        }
    }

    fn allocate_large(&mut self, bytes: usize) -> Result<*mut u8, PoolError> {
        let layout = large_layout(bytes)?;
        // SAFETY: layout has nonzero size (bytes > max_object_size >= 1).
        let raw = unsafe { std::alloc::alloc(layout) };
        if raw.is_null() {
            self.record(
                PoolLogLevel::Warn,
                "allocate",
                "large_alloc",
                None,
                Some(bytes),
                None,
                "oom",
                String::new(),
            );
            return Err(PoolError::SystemAllocation { bytes });
        }

        self.large_allocs += 1;
        self.record(
            PoolLogLevel::Trace,
            "allocate",
            "large_alloc",
            Some(raw as usize),
            Some(bytes),
            None,
            "success",
            String::new(),
        );
        Ok(raw)
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// The per-class fixed allocators, indexed by size class.
    pub fn pools(&self) -> &[FixedAllocator] {
        &self.pool
    }

    /// Counter and occupancy snapshot.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            classes: self.pool.len(),
            chunks: self.pool.iter().map(FixedAllocator::chunk_count).sum(),
            outstanding_blocks: self
                .pool
                .iter()
                .map(FixedAllocator::outstanding_blocks)
                .sum(),
            free_blocks: self.pool.iter().map(FixedAllocator::free_blocks).sum(),
            pool_allocs: self.pool_allocs,
            pool_deallocs: self.pool_deallocs,
            large_allocs: self.large_allocs,
            large_deallocs: self.large_deallocs,
        }
    }

    /// Recorded lifecycle entries (empty unless diagnostics are enabled).
    pub fn lifecycle_logs(&self) -> &[PoolLogRecord] {
        &self.lifecycle_logs
    }

    /// Drains and returns the recorded lifecycle entries.
    pub fn drain_lifecycle_logs(&mut self) -> Vec<PoolLogRecord> {
        std::mem::take(&mut self.lifecycle_logs)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        level: PoolLogLevel,
        op: &'static str,
        event: &'static str,
        ptr: Option<usize>,
        bytes: Option<usize>,
        class_index: Option<usize>,
        outcome: &'static str,
        details: String,
    ) {
        if !self.config.diagnostics {
            return;
        }

        let decision_id = self.next_decision_id;
        self.next_decision_id = self.next_decision_id.wrapping_add(1);
        let stats = self.stats();
        self.lifecycle_logs.push(PoolLogRecord {
            decision_id,
            level,
            op,
            event,
            ptr,
            bytes,
            class_index,
            outcome,
            details,
            outstanding_blocks: stats.outstanding_blocks,
            chunks: stats.chunks,
        });
    }
}

fn large_layout(bytes: usize) -> Result<Layout, PoolError> {
    Layout::from_size_align(bytes, LARGE_OBJECT_ALIGN).map_err(|_| PoolError::InvalidLayout {
        bytes,
        align: LARGE_OBJECT_ALIGN,
    })
}
