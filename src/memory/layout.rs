//! Address-space layout.
//!
//! The kernel region sits at global offset 0, the user region directly
//! above it. Sizes are fixed for the lifetime of an address space.

/// Block size in bytes: the allocation granule.
pub const BLOCK_SIZE: usize = 4;

/// Size alignment applied to every allocation request.
pub const ALIGNMENT: usize = 4;

/// Total linear memory: 128 MiB.
pub const MEMORY_TOTAL: usize = 128 * 1024 * 1024;

/// Kernel region: 16 MiB at offset 0.
pub const KERNEL_HEAP_SIZE: usize = 16 * 1024 * 1024;

/// User region: everything above the kernel region (112 MiB).
pub const USER_HEAP_SIZE: usize = MEMORY_TOTAL - KERNEL_HEAP_SIZE;

/// Region sizes and allocation granularity of one address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    kernel_size: usize,
    user_size: usize,
    block_size: usize,
    alignment: usize,
}

/// Why a layout was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// Block size or alignment is zero.
    ZeroGranule,
    /// A region is empty or not a whole number of blocks.
    RegionSize { size: usize, block_size: usize },
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LayoutError::ZeroGranule => write!(f, "block size and alignment must be non-zero"),
            LayoutError::RegionSize { size, block_size } => write!(
                f,
                "region size {} is not a non-zero multiple of block size {}",
                size, block_size
            ),
        }
    }
}

impl Layout {
    /// The fixed layout the host runs with.
    pub const DEFAULT: Layout = Layout {
        kernel_size: KERNEL_HEAP_SIZE,
        user_size: USER_HEAP_SIZE,
        block_size: BLOCK_SIZE,
        alignment: ALIGNMENT,
    };

    /// Build a custom layout.
    pub fn new(
        kernel_size: usize,
        user_size: usize,
        block_size: usize,
        alignment: usize,
    ) -> Result<Self, LayoutError> {
        if block_size == 0 || alignment == 0 {
            return Err(LayoutError::ZeroGranule);
        }
        for size in [kernel_size, user_size] {
            if size == 0 || size % block_size != 0 {
                return Err(LayoutError::RegionSize { size, block_size });
            }
        }
        Ok(Layout { kernel_size, user_size, block_size, alignment })
    }

    /// Small layout with the default granule, for tests and tools.
    pub fn with_sizes(kernel_size: usize, user_size: usize) -> Result<Self, LayoutError> {
        Self::new(kernel_size, user_size, BLOCK_SIZE, ALIGNMENT)
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn user_size(&self) -> usize {
        self.user_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Global offset of the user region.
    pub fn user_base(&self) -> usize {
        self.kernel_size
    }

    /// Size of the whole address space.
    pub fn total(&self) -> usize {
        self.kernel_size + self.user_size
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::DEFAULT
    }
}
