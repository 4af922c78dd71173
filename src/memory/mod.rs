//! Memory management for the kernel.
//!
//! Provides:
//! - A block map per region (byte-per-block occupancy)
//! - First-fit region allocators for the kernel and user regions
//! - The address space tying both regions to one global pointer range
//! - The kernel's own bookkeeping heap on wasm32

pub mod block_map;
pub mod layout;
pub mod region;
pub mod space;

#[cfg(target_arch = "wasm32")]
pub mod heap;

#[cfg(test)]
mod tests_prop;

pub use block_map::{BlockMap, BlockState};
pub use layout::{Layout, LayoutError};
pub use region::RegionAllocator;
pub use space::AddressSpace;

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be non-zero.
///
/// Panics if the result does not fit a `usize`; see [`checked_align_to`].
pub const fn align_to(value: usize, alignment: usize) -> usize {
    match checked_align_to(value, alignment) {
        Some(aligned) => aligned,
        None => panic!("align_to overflow"),
    }
}

/// [`align_to`], or `None` if the result does not fit a `usize`.
pub const fn checked_align_to(value: usize, alignment: usize) -> Option<usize> {
    value.checked_next_multiple_of(alignment)
}

// ─── Region ─────────────────────────────────────────────────────

/// One of the two disjoint address ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Privileged memory at the bottom of the address space.
    Kernel,
    /// Unprivileged memory directly above the kernel region.
    User,
}

impl Region {
    /// Map a host-side selector (0 = kernel, 1 = user) to a region.
    pub fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            0 => Some(Region::Kernel),
            1 => Some(Region::User),
            _ => None,
        }
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Region::Kernel => write!(f, "kernel"),
            Region::User => write!(f, "user"),
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────

/// Reported memory errors. None of these change any state.
///
/// Running out of memory is not in here: that is a fatal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// Free of a pointer outside the region it was aimed at.
    InvalidFree { op: &'static str, region: Region, ptr: usize },
    /// Raw access outside both regions, or straddling their boundary.
    OutOfBounds { op: &'static str, addr: usize },
}

impl core::fmt::Display for MemError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            MemError::InvalidFree { op, region, ptr } => {
                write!(f, "{}: invalid {}-space free: {:#x}", op, region, ptr)
            }
            MemError::OutOfBounds { op, addr } => {
                write!(f, "{}: address {:#x} out of bounds", op, addr)
            }
        }
    }
}

/// Abort the allocating context: the region has no run long enough.
#[cold]
#[track_caller]
pub(crate) fn out_of_memory(region: Region, size: usize, required: usize, free: usize) -> ! {
    panic!(
        "out of memory: {} region cannot fit {} bytes ({} blocks, {} free)",
        region, size, required, free
    )
}
