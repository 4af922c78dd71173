//! First-fit allocator over one region.
//!
//! Pointers handed out here are offsets into the region's own buffer.
//! Translating them to global addresses is the address space's job.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use super::{checked_align_to, out_of_memory, BlockMap, BlockState, MemError, Region};

/// A region's backing bytes and the block map describing them.
pub struct RegionAllocator {
    region: Region,
    block_size: usize,
    alignment: usize,
    buffer: Vec<u8>,
    map: BlockMap,
}

impl RegionAllocator {
    /// Create an all-free region of `size` bytes.
    ///
    /// `size` must be a multiple of `block_size`; [`Layout`](super::Layout)
    /// guarantees that for the regions of an address space.
    pub fn new(region: Region, size: usize, block_size: usize, alignment: usize) -> Self {
        RegionAllocator {
            region,
            block_size,
            alignment,
            buffer: vec![0; size],
            map: BlockMap::new(size / block_size),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Region size in bytes.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn map(&self) -> &BlockMap {
        &self.map
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Number of blocks an allocation of `size` bytes occupies, or `None`
    /// when the aligned size does not even fit a `usize`.
    pub fn blocks_for(&self, size: usize) -> Option<usize> {
        checked_align_to(size, self.alignment).map(|aligned| aligned / self.block_size)
    }

    /// Name of the free operation on this region, for reported errors.
    fn free_op(&self) -> &'static str {
        match self.region {
            Region::Kernel => "free_kernel",
            Region::User => "free_user",
        }
    }

    /// Allocate `size` bytes and return the region offset.
    ///
    /// Panics when no free run is long enough. Out of memory is fatal.
    #[track_caller]
    pub fn allocate(&mut self, size: usize) -> usize {
        self.allocate_blocks(size).start * self.block_size
    }

    /// Allocate `size` bytes and return the block range marked used.
    ///
    /// A zero-sized request yields an empty range at the first free block.
    #[track_caller]
    pub fn allocate_blocks(&mut self, size: usize) -> Range<usize> {
        let Some(required) = self.blocks_for(size) else {
            out_of_memory(self.region, size, usize::MAX, self.map.free_count());
        };
        let Some(start) = self.map.first_fit(required) else {
            out_of_memory(self.region, size, required, self.map.free_count());
        };
        let blocks = self.map.mark(start..start + required, BlockState::Used);
        log::debug!("{} alloc: {} bytes at block {}", self.region, size, start);
        blocks
    }

    /// Free `size` bytes at region offset `ptr`.
    ///
    /// Only the pointer is checked. The blocks are released whether or not
    /// they were allocated, and a range running past the end of the map is
    /// cut off there. Returns the block range released.
    pub fn free(&mut self, ptr: usize, size: usize) -> Result<Range<usize>, MemError> {
        if ptr >= self.size() {
            let err = MemError::InvalidFree {
                op: self.free_op(),
                region: self.region,
                ptr,
            };
            log::warn!("{}", err);
            return Err(err);
        }
        let start = ptr / self.block_size;
        let count = size.div_ceil(self.block_size);
        Ok(self.map.mark(start..start.saturating_add(count), BlockState::Free))
    }

    /// Zero the backing bytes of `blocks`.
    pub fn zero_blocks(&mut self, blocks: Range<usize>) {
        let blocks = self.map.clamp(blocks);
        let bytes = blocks.start * self.block_size..blocks.end * self.block_size;
        self.buffer[bytes].fill(0);
    }

    pub fn used_blocks(&self) -> usize {
        self.map.used_count()
    }

    pub fn free_blocks(&self) -> usize {
        self.map.free_count()
    }

    /// Render the first `count` block map entries.
    pub fn dump(&self, count: usize) -> String {
        self.map.render(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(size: usize) -> RegionAllocator {
        RegionAllocator::new(Region::Kernel, size, 4, 4)
    }

    #[test]
    fn allocates_consecutively() {
        let mut r = region(64);
        assert_eq!(r.allocate(4), 0);
        assert_eq!(r.allocate(5), 4);
        assert_eq!(r.allocate(1), 12);
        assert_eq!(r.used_blocks(), 4);
    }

    #[test]
    fn reuses_first_hole() {
        let mut r = region(64);
        let a = r.allocate(8);
        let _b = r.allocate(8);
        r.free(a, 8).unwrap();
        assert_eq!(r.allocate(4), a);
        // Second block of the hole is still free.
        assert_eq!(r.allocate(4), 4);
    }

    #[test]
    fn skips_hole_that_is_too_small() {
        let mut r = region(64);
        let a = r.allocate(4);
        let _b = r.allocate(4);
        r.free(a, 4).unwrap();
        assert_eq!(r.allocate(8), 8);
        assert_eq!(r.allocate(4), 0);
    }

    #[test]
    fn zero_sized_allocation_marks_nothing() {
        let mut r = region(16);
        r.allocate(4);
        assert_eq!(r.allocate(0), 4);
        assert_eq!(r.used_blocks(), 1);
        assert_eq!(r.allocate_blocks(0), 1..1);
    }

    #[test]
    fn alignment_rounds_block_count() {
        let mut r = RegionAllocator::new(Region::Kernel, 64, 4, 8);
        assert_eq!(r.blocks_for(1), Some(2));
        assert_eq!(r.blocks_for(usize::MAX), None);
        assert_eq!(r.allocate(1), 0);
        assert_eq!(r.allocate(1), 8);
    }

    #[test]
    #[should_panic(expected = "out of memory: kernel region")]
    fn exhaustion_is_fatal() {
        let mut r = region(16);
        r.allocate(16);
        r.allocate(1);
    }

    #[test]
    #[should_panic(expected = "out of memory: kernel region cannot fit")]
    fn unalignable_size_is_fatal() {
        let mut r = region(64);
        r.allocate(usize::MAX);
    }

    #[test]
    #[should_panic(expected = "out of memory: kernel region cannot fit")]
    fn size_just_below_overflow_is_fatal() {
        let mut r = region(64);
        r.allocate(usize::MAX - 2);
    }

    #[test]
    #[should_panic(expected = "out of memory")]
    fn zero_sized_allocation_in_full_region_is_fatal() {
        let mut r = region(8);
        r.allocate(8);
        r.allocate(0);
    }

    #[test]
    fn free_out_of_range_changes_nothing() {
        let mut r = region(16);
        r.allocate(8);
        r.bytes_mut()[0] = 0xaa;
        assert_eq!(
            r.free(16, 4),
            Err(MemError::InvalidFree { op: "free_kernel", region: Region::Kernel, ptr: 16 })
        );
        assert_eq!(r.used_blocks(), 2);
        assert_eq!(r.bytes()[0], 0xaa);
    }

    #[test]
    fn free_past_the_end_is_clamped() {
        let mut r = region(16);
        r.allocate(16);
        assert_eq!(r.free(8, 1024), Ok(2..4));
        assert_eq!(r.used_blocks(), 2);
    }

    #[test]
    fn free_does_not_zero_by_itself() {
        let mut r = region(16);
        let p = r.allocate(4);
        r.bytes_mut()[p] = 7;
        r.free(p, 4).unwrap();
        assert_eq!(r.bytes()[p], 7);
        r.zero_blocks(0..1);
        assert_eq!(r.bytes()[p], 0);
    }
}
