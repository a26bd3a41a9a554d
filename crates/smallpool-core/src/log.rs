//! Structured lifecycle records for pool diagnostics.
//!
//! When diagnostics are enabled, every operator-level call appends one record
//! to an in-memory vector that the embedder drains and ships wherever it
//! wants. Nothing is written anywhere by the pool itself, and the default is
//! to record nothing at all.

use serde::Serialize;

/// Severity of a lifecycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolLogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

/// One structured record per operator-level pool operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolLogRecord {
    /// Monotonic event id.
    pub decision_id: u64,
    /// Severity level.
    pub level: PoolLogLevel,
    /// API entry point (`allocate`, `deallocate`, `deallocate_unsized`).
    pub op: &'static str,
    /// Event kind (`pool_alloc`, `large_alloc`, `pool_free`, ...).
    pub event: &'static str,
    /// Pointer address involved in the event.
    pub ptr: Option<usize>,
    /// Request size in bytes.
    pub bytes: Option<usize>,
    /// Size-class index for pooled requests.
    pub class_index: Option<usize>,
    /// Machine-readable outcome label.
    pub outcome: &'static str,
    /// Free-form details for debugging.
    pub details: String,
    /// Snapshot: blocks currently handed out across all classes.
    pub outstanding_blocks: usize,
    /// Snapshot: chunks currently owned across all classes.
    pub chunks: usize,
}
