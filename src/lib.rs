//! Zaplet Kernel
//!
//! The memory-management core of a WASM-hosted toy kernel:
//! - Kernel and user regions, each with a first-fit block allocator
//! - Per-block ownership of user memory, gating reads
//! - A process table handing one user region to every spawned process
//!
//! Loading the module and bridging the console are the host's job.

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod config;
pub mod console;
pub mod exports;
pub mod kernel;
pub mod memory;
pub mod owners;
pub mod task;

pub use config::Config;
pub use kernel::Kernel;
pub use memory::{AddressSpace, Layout, MemError, Region};
pub use task::{Pid, Process, ProcessError, ProcessState};

/// Panic handler for kernel panics.
///
/// Out-of-memory faults land here: the message is printed through the host
/// console and the module traps.
#[cfg(target_arch = "wasm32")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::println!("\n!!! KERNEL PANIC !!!");
    crate::println!("{}", info);

    core::arch::wasm32::unreachable()
}
