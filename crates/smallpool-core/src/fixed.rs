//! Pool of chunks for one block-size class.
//!
//! A `FixedAllocator` owns a sequence of equally shaped chunks and two
//! cursor caches: the chunk that served the last allocation and the chunk
//! that received the last deallocation. Allocation prefers the cached chunk;
//! deallocation locates the owning chunk by walking outward from the cached
//! one, exploiting the locality of deallocation bursts. Both caches are
//! indices into the chunk sequence so that growth and the reclamation swap
//! never leave them dangling.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::chunk::Chunk;
use crate::config::{MAX_BLOCKS_PER_CHUNK, MAX_SUPPORTED_ALIGNMENT, MIN_BLOCKS_PER_CHUNK};
use crate::PoolError;

/// What a deallocation did to the chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeallocOutcome {
    /// Block returned; the owning chunk still holds live blocks.
    Returned,
    /// The owning chunk became empty and is kept as the spare.
    SpareRetained,
    /// An empty tail chunk's slab was released back to the heap.
    BackReleased,
    /// The owning chunk became empty and was swapped to the tail.
    SwappedToBack,
    /// The pointer is not owned by this allocator; nothing was done.
    ForeignPointer,
}

impl DeallocOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Returned => "returned",
            Self::SpareRetained => "spare_retained",
            Self::BackReleased => "back_released",
            Self::SwappedToBack => "swapped_to_back",
            Self::ForeignPointer => "foreign_pointer",
        }
    }
}

/// Allocator for blocks of one fixed size.
#[derive(Debug)]
pub struct FixedAllocator {
    block_size: usize,
    blocks_per_chunk: u8,
    slab_align: usize,
    chunks: Vec<Chunk>,
    /// Index of the chunk used for the last allocation.
    last_alloc: Option<usize>,
    /// Index of the chunk used for the last deallocation.
    last_dealloc: Option<usize>,
    /// Chunks examined by the most recent vicinity search.
    last_vicinity_probes: usize,
}

// SAFETY: the chunk slabs are plain heap allocations exclusively owned by
// this allocator; nothing references thread-local state. Callers moving the
// allocator across threads take responsibility for the raw pointers they
// were handed out, exactly as with any other raw-pointer-returning allocator.
unsafe impl Send for FixedAllocator {}

impl FixedAllocator {
    /// Creates an allocator for `block_size`-byte blocks.
    ///
    /// `chunk_size` is the desired slab size in bytes; the resulting blocks
    /// per chunk are clamped to `[MIN_BLOCKS_PER_CHUNK, MAX_BLOCKS_PER_CHUNK]`.
    /// No slab is acquired until the first allocation.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn new(block_size: usize, chunk_size: usize) -> Self {
        assert!(block_size > 0, "block size must be nonzero");

        let blocks = (chunk_size / block_size)
            .clamp(MIN_BLOCKS_PER_CHUNK as usize, MAX_BLOCKS_PER_CHUNK as usize)
            as u8;

        // The largest power of two dividing block_size, capped at the
        // supported maximum. Every size class is a multiple of the pool
        // alignment, so slabs aligned this way keep every block aligned.
        let align_log2 = block_size
            .trailing_zeros()
            .min(MAX_SUPPORTED_ALIGNMENT.trailing_zeros());
        let slab_align = 1usize << align_log2;

        Self {
            block_size,
            blocks_per_chunk: blocks,
            slab_align,
            chunks: Vec::new(),
            last_alloc: None,
            last_dealloc: None,
            last_vicinity_probes: 0,
        }
    }

    /// Returns one block.
    ///
    /// Prefers the chunk that served the previous allocation, then the first
    /// chunk with a free block, then a freshly acquired chunk. A slab
    /// acquisition failure propagates without disturbing existing state.
    pub fn allocate(&mut self) -> Result<NonNull<u8>, PoolError> {
        let index = match self.last_alloc {
            Some(i) if i < self.chunks.len() && self.chunks[i].free_count() > 0 => i,
            _ => match self.chunks.iter().position(|c| c.free_count() > 0) {
                Some(i) => i,
                None => self.grow()?,
            },
        };
        self.last_alloc = Some(index);

        let block = self.chunks[index]
            .allocate(self.block_size)
            .expect("selected chunk has a free block");
        Ok(block)
    }

    /// Returns `ptr`'s block to its owning chunk and applies the reclamation
    /// policy when that chunk becomes empty.
    ///
    /// `ptr` must have been returned by [`FixedAllocator::allocate`] on this
    /// allocator and not freed since; an unowned pointer is a contract
    /// violation and is ignored (after a debug assertion).
    pub fn deallocate(&mut self, ptr: NonNull<u8>) -> DeallocOutcome {
        let Some(index) = self.find_in_vicinity(ptr) else {
            debug_assert!(false, "pointer does not belong to this allocator");
            return DeallocOutcome::ForeignPointer;
        };

        self.last_dealloc = Some(index);
        self.chunks[index].deallocate(ptr, self.block_size, self.blocks_per_chunk);

        if self.chunks[index].free_count() == self.blocks_per_chunk {
            self.reclaim(index)
        } else {
            DeallocOutcome::Returned
        }
    }

    /// Returns the index of the chunk owning `ptr`, scanning every chunk.
    pub fn has_block(&self, ptr: NonNull<u8>) -> Option<usize> {
        let chunk_len = self.chunk_len();
        self.chunks.iter().position(|c| c.has_block(ptr, chunk_len))
    }

    /// Bidirectional walk outward from the last-deallocation chunk.
    ///
    /// Deallocations cluster near recent ones, so the owner is usually the
    /// cached chunk or an immediate neighbor; the walk degrades to a full
    /// scan for arbitrary pointers.
    fn find_in_vicinity(&mut self, ptr: NonNull<u8>) -> Option<usize> {
        if self.chunks.is_empty() {
            self.last_vicinity_probes = 0;
            return None;
        }

        let chunk_len = self.chunk_len();
        let start = self.last_dealloc.unwrap_or(0).min(self.chunks.len() - 1);
        let mut lower = Some(start);
        let mut upper = (start + 1 < self.chunks.len()).then_some(start + 1);
        let mut probes = 0;

        while lower.is_some() || upper.is_some() {
            if let Some(i) = lower {
                probes += 1;
                if self.chunks[i].has_block(ptr, chunk_len) {
                    self.last_vicinity_probes = probes;
                    return Some(i);
                }
                lower = if i == 0 { None } else { Some(i - 1) };
            }
            if let Some(i) = upper {
                probes += 1;
                if self.chunks[i].has_block(ptr, chunk_len) {
                    self.last_vicinity_probes = probes;
                    return Some(i);
                }
                upper = (i + 1 < self.chunks.len()).then_some(i + 1);
            }
        }

        self.last_vicinity_probes = probes;
        None
    }

    /// Applies the reclamation policy to the just-emptied chunk at `index`.
    ///
    /// At most one empty chunk is retained as a spare, to damp slab churn
    /// when the workload oscillates around a chunk-full boundary.
    fn reclaim(&mut self, index: usize) -> DeallocOutcome {
        let back = self.chunks.len() - 1;

        if index == back {
            // The emptied chunk already sits at the tail. Release it only if
            // the chunk before it is empty too; otherwise it stays as the
            // spare.
            if back > 0 && self.chunks[back - 1].free_count() == self.blocks_per_chunk {
                self.release_back();
                self.last_alloc = Some(0);
                self.last_dealloc = Some(0);
                return DeallocOutcome::BackReleased;
            }
            return DeallocOutcome::SpareRetained;
        }

        if self.chunks[back].free_count() == self.blocks_per_chunk {
            // The tail already holds the spare; release it and let the
            // just-emptied chunk take over that role.
            self.release_back();
            self.last_alloc = self.last_dealloc;
            DeallocOutcome::BackReleased
        } else {
            // Move the emptied chunk to the tail so the single spare always
            // gravitates there.
            self.chunks.swap(index, back);
            self.last_alloc = Some(back);
            DeallocOutcome::SwappedToBack
        }
    }

    fn release_back(&mut self) {
        let layout = self.slab_layout().expect("valid layout");
        let mut chunk = self.chunks.pop().expect("chunk sequence is not empty");
        chunk.release(layout);
    }

    /// Acquires a fresh chunk and returns its index.
    fn grow(&mut self) -> Result<usize, PoolError> {
        let layout = self.slab_layout()?;
        let chunk = Chunk::new(self.block_size, self.blocks_per_chunk, layout)?;
        self.chunks.push(chunk);
        if self.last_dealloc.is_none() {
            self.last_dealloc = Some(0);
        }
        Ok(self.chunks.len() - 1)
    }

    fn slab_layout(&self) -> Result<Layout, PoolError> {
        let bytes = self.chunk_len();
        Layout::from_size_align(bytes, self.slab_align).map_err(|_| PoolError::InvalidLayout {
            bytes,
            align: self.slab_align,
        })
    }

    fn chunk_len(&self) -> usize {
        self.block_size * self.blocks_per_chunk as usize
    }

    /// Bytes per block in this class.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Blocks per chunk after clamping.
    pub fn blocks_per_chunk(&self) -> usize {
        self.blocks_per_chunk as usize
    }

    /// Number of chunks currently owned.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total free blocks across all chunks.
    pub fn free_blocks(&self) -> usize {
        self.chunks.iter().map(|c| c.free_count() as usize).sum()
    }

    /// Blocks currently handed out to callers.
    pub fn outstanding_blocks(&self) -> usize {
        self.chunks.len() * self.blocks_per_chunk as usize - self.free_blocks()
    }

    /// Number of chunks with every block free.
    pub fn empty_chunks(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.free_count() == self.blocks_per_chunk)
            .count()
    }

    pub fn last_alloc_index(&self) -> Option<usize> {
        self.last_alloc
    }

    pub fn last_dealloc_index(&self) -> Option<usize> {
        self.last_dealloc
    }

    /// Chunks examined by the most recent deallocation's vicinity search.
    pub fn last_vicinity_probes(&self) -> usize {
        self.last_vicinity_probes
    }
}

impl Drop for FixedAllocator {
    fn drop(&mut self) {
        if self.chunks.is_empty() {
            return;
        }
        let layout = self.slab_layout().expect("valid layout");
        for chunk in &mut self.chunks {
            chunk.release(layout);
        }
    }
}
