//! Kernel bookkeeping heap (wasm32).
//!
//! Grows linear memory by enough pages for `HEAP_SIZE` bytes and registers
//! a linked_list_allocator over them as the #[global_allocator]. Both
//! region buffers and their block maps live in this heap.

use core::sync::atomic::{AtomicBool, Ordering};

use linked_list_allocator::LockedHeap;

/// Size of the kernel heap: both regions (128 MiB), their block maps
/// (32 MiB) and room for ownership tables.
pub const HEAP_SIZE: usize = 256 * 1024 * 1024;

/// WebAssembly page size.
const WASM_PAGE_SIZE: usize = 64 * 1024;

/// The global heap allocator.
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

static READY: AtomicBool = AtomicBool::new(false);

/// Heap setup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The host refused to grow linear memory.
    GrowFailed { pages: usize },
}

impl core::fmt::Display for HeapError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            HeapError::GrowFailed { pages } => write!(f, "memory.grow of {} pages failed", pages),
        }
    }
}

/// Initialize the kernel heap. Later calls are no-ops.
pub fn init_heap() -> Result<(), HeapError> {
    if READY.load(Ordering::Acquire) {
        return Ok(());
    }

    let pages = HEAP_SIZE.div_ceil(WASM_PAGE_SIZE);
    let previous = core::arch::wasm32::memory_grow::<0>(pages);
    if previous == usize::MAX {
        return Err(HeapError::GrowFailed { pages });
    }

    // SAFETY: the pages were just added to linear memory and nothing else
    // refers to them.
    unsafe {
        ALLOCATOR
            .lock()
            .init((previous * WASM_PAGE_SIZE) as *mut u8, pages * WASM_PAGE_SIZE);
    }
    READY.store(true, Ordering::Release);
    Ok(())
}
