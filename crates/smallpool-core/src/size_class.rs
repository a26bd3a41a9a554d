//! Size-class arithmetic.
//!
//! Requests are rounded up to the nearest multiple of the configured
//! alignment. Class `i` serves requests in `(i * alignment, (i + 1) *
//! alignment]`, so a pool needs `ceil(max_object_size / alignment)` classes.

/// Number of size classes needed to cover `(0, max_object_size]`.
pub fn class_count(max_object_size: usize, alignment: usize) -> usize {
    max_object_size.div_ceil(alignment)
}

/// Computes the class index for a request of `bytes` (must be nonzero).
pub fn class_index(bytes: usize, alignment: usize) -> usize {
    debug_assert!(bytes > 0);
    bytes.div_ceil(alignment) - 1
}

/// Returns the block size served by class `index`.
pub fn class_size(index: usize, alignment: usize) -> usize {
    (index + 1) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_index_rounds_up() {
        assert_eq!(class_index(1, 4), 0);
        assert_eq!(class_index(4, 4), 0);
        assert_eq!(class_index(5, 4), 1);
        assert_eq!(class_index(8, 4), 1);
        assert_eq!(class_index(256, 4), 63);
    }

    #[test]
    fn test_class_size_round_trip() {
        for alignment in [1, 2, 4, 8, 16] {
            for index in 0..64 {
                let size = class_size(index, alignment);
                assert_eq!(class_index(size, alignment), index);
            }
        }
    }

    #[test]
    fn test_class_count_covers_max() {
        assert_eq!(class_count(256, 4), 64);
        assert_eq!(class_count(255, 4), 64);
        assert_eq!(class_count(1, 4), 1);
        assert_eq!(class_count(16, 16), 1);
    }

    #[test]
    fn test_selected_class_fits_request() {
        // The chosen class serves the request without wasting a full
        // alignment step.
        let alignment = 4;
        let max = 256;
        for bytes in 1..=max {
            let index = class_index(bytes, alignment);
            assert!(index < class_count(max, alignment));
            let size = class_size(index, alignment);
            assert!(size >= bytes);
            assert!(size < bytes + alignment);
        }
    }
}
