//! Pool configuration and tuning constants.
//!
//! The defaults reproduce the classic small-object regime: 4 KiB slabs,
//! objects up to 256 bytes, size classes every 4 bytes. Anything larger than
//! `max_object_size` bypasses the pool and goes straight to the system heap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Desired bytes per chunk slab. The actual slab size is
/// `block_size * blocks_per_chunk` after clamping.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Largest request (bytes) routed through the pool. Above this, the system
/// heap serves the request directly.
pub const MAX_OBJECT_SIZE: usize = 256;

/// Default size-class granularity (bytes). Class `i` serves requests in
/// `(i * alignment, (i + 1) * alignment]`.
pub const DEFAULT_OBJECT_ALIGNMENT: usize = 4;

/// Lower clamp on blocks per chunk.
pub const MIN_BLOCKS_PER_CHUNK: u8 = 4;

/// Upper clamp on blocks per chunk. Forced by the byte-sized free-list link:
/// a block index must fit in a `u8` alongside the past-the-end sentinel.
pub const MAX_BLOCKS_PER_CHUNK: u8 = u8::MAX;

/// Largest supported size-class alignment (bytes). Slabs and the system-heap
/// fallback are aligned to at most this.
pub const MAX_SUPPORTED_ALIGNMENT: usize = 16;

/// Construction parameters for a [`SmallObjectAllocator`].
///
/// [`SmallObjectAllocator`]: crate::SmallObjectAllocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Desired bytes per chunk slab.
    pub chunk_size: usize,
    /// Largest request routed through the pool.
    pub max_object_size: usize,
    /// Size-class granularity; must be a power of two up to
    /// [`MAX_SUPPORTED_ALIGNMENT`].
    pub alignment: usize,
    /// Record a structured lifecycle entry per operation. Development aid,
    /// off by default.
    #[serde(default)]
    pub diagnostics: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_object_size: MAX_OBJECT_SIZE,
            alignment: DEFAULT_OBJECT_ALIGNMENT,
            diagnostics: false,
        }
    }
}

impl PoolConfig {
    /// Checks that the configuration describes a buildable pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.max_object_size == 0 {
            return Err(ConfigError::ZeroMaxObjectSize);
        }
        if !self.alignment.is_power_of_two() || self.alignment > MAX_SUPPORTED_ALIGNMENT {
            return Err(ConfigError::UnsupportedAlignment {
                alignment: self.alignment,
            });
        }
        Ok(())
    }
}

/// Rejected [`PoolConfig`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk size must be nonzero")]
    ZeroChunkSize,
    #[error("max object size must be nonzero")]
    ZeroMaxObjectSize,
    #[error("alignment {alignment} must be a power of two no larger than {max}", max = MAX_SUPPORTED_ALIGNMENT)]
    UnsupportedAlignment { alignment: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PoolConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = PoolConfig {
            chunk_size: 0,
            ..PoolConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_zero_max_object_size_rejected() {
        let config = PoolConfig {
            max_object_size: 0,
            ..PoolConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxObjectSize));
    }

    #[test]
    fn test_alignment_must_be_power_of_two() {
        for alignment in [0, 3, 6, 12] {
            let config = PoolConfig {
                alignment,
                ..PoolConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::UnsupportedAlignment { alignment })
            );
        }
    }

    #[test]
    fn test_alignment_upper_bound() {
        let config = PoolConfig {
            alignment: 32,
            ..PoolConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedAlignment { alignment: 32 })
        );

        let config = PoolConfig {
            alignment: MAX_SUPPORTED_ALIGNMENT,
            ..PoolConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = PoolConfig {
            chunk_size: 1024,
            max_object_size: 128,
            alignment: 8,
            diagnostics: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PoolConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_diagnostics_default_off_in_serde() {
        let back: PoolConfig = serde_json::from_str(
            r#"{"chunk_size":4096,"max_object_size":256,"alignment":4}"#,
        )
        .unwrap();
        assert!(!back.diagnostics);
    }
}
