//! Byte-per-block occupancy map.
//!
//! Pure data structure: it knows which blocks are used, not who asked for
//! them or why. Its length is fixed at construction.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Write;
use core::ops::Range;

/// Occupancy of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockState {
    Free = 0,
    Used = 1,
}

/// One occupancy entry per block of a region.
#[derive(Debug, Clone)]
pub struct BlockMap {
    blocks: Vec<BlockState>,
}

impl BlockMap {
    /// Create a map of `count` free blocks.
    pub fn new(count: usize) -> Self {
        BlockMap { blocks: vec![BlockState::Free; count] }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<BlockState> {
        self.blocks.get(index).copied()
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.get(index) == Some(BlockState::Used)
    }

    /// Set every block in `range` to `state`.
    ///
    /// The range is clamped to the map, so callers may pass ranges that run
    /// past the end.
    pub fn mark(&mut self, range: Range<usize>, state: BlockState) -> Range<usize> {
        let range = self.clamp(range);
        self.blocks[range.clone()].fill(state);
        range
    }

    /// Clamp `range` to the blocks that exist.
    pub fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.blocks.len());
        range.start.min(end)..end
    }

    /// Index of the first run of `required` free blocks.
    ///
    /// The scan stops at the first run that is long enough. A request for
    /// zero blocks matches at the first free block; with no free block at
    /// all nothing matches.
    pub fn first_fit(&self, required: usize) -> Option<usize> {
        let mut run_start = None;
        let mut run_len = 0;

        for (index, state) in self.blocks.iter().enumerate() {
            match state {
                BlockState::Free => {
                    let start = *run_start.get_or_insert(index);
                    run_len += 1;
                    if run_len >= required {
                        return Some(start);
                    }
                }
                BlockState::Used => {
                    run_start = None;
                    run_len = 0;
                }
            }
        }
        None
    }

    pub fn used_count(&self) -> usize {
        self.blocks.iter().filter(|b| **b == BlockState::Used).count()
    }

    pub fn free_count(&self) -> usize {
        self.len() - self.used_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockState> + '_ {
        self.blocks.iter().copied()
    }

    /// Render the first `count` entries as space-separated `0`/`1`.
    pub fn render(&self, count: usize) -> String {
        let mut out = String::new();
        for state in self.blocks.iter().take(count) {
            let _ = write!(out, "{} ", *state as u8);
        }
        out
    }
}
