//! Lazy process-wide pool instance.
//!
//! The instance is constructed on first access and lives until process
//! teardown; outstanding allocations are never explicitly freed. The cell
//! publishes the fully constructed allocator with release/acquire ordering,
//! so racing first accesses observe either nothing or a complete instance,
//! and exactly one construction wins.

use std::sync::OnceLock;

use parking_lot::Mutex;
use smallpool_core::{PoolConfig, SmallObjectAllocator};

static GLOBAL_POOL: OnceLock<Mutex<SmallObjectAllocator>> = OnceLock::new();

/// The process-wide pool, constructed with [`PoolConfig::default`] on first
/// access.
///
/// The engine itself is single-threaded; the mutex serializes callers.
pub fn global_pool() -> &'static Mutex<SmallObjectAllocator> {
    global_pool_with(PoolConfig::default())
}

/// The process-wide pool, constructed with `config` if and only if no
/// instance exists yet. The first configuration wins; later calls return the
/// existing instance and ignore their argument.
///
/// # Panics
///
/// Panics if this call performs the first construction and `config` is
/// invalid.
pub fn global_pool_with(config: PoolConfig) -> &'static Mutex<SmallObjectAllocator> {
    GLOBAL_POOL.get_or_init(|| {
        Mutex::new(SmallObjectAllocator::new(config).expect("valid pool configuration"))
    })
}
