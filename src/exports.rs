//! Host-facing entry points.
//!
//! The host sees plain `i32`s. Negative pointers, sizes and pids cannot
//! name anything, so they are reported and treated like any other invalid
//! argument. Symbols are only unmangled on wasm32, where the host links
//! against them.

use lazy_static::lazy_static;
use spin::{Mutex, MutexGuard};

use crate::config::Config;
use crate::kernel::Kernel;
use crate::memory::Region;
use crate::task::Pid;

lazy_static! {
    static ref KERNEL: Mutex<Kernel> = Mutex::new(Kernel::new(Config::DEFAULT));
}

/// Lock the kernel, bringing up the heap first on wasm32.
fn kernel() -> MutexGuard<'static, Kernel> {
    #[cfg(target_arch = "wasm32")]
    bring_up_heap();
    KERNEL.lock()
}

#[cfg(target_arch = "wasm32")]
fn bring_up_heap() {
    if let Err(err) = crate::memory::heap::init_heap() {
        panic!("heap initialization failed: {}", err);
    }
}

fn arg(op: &'static str, name: &str, value: i32) -> Option<usize> {
    let converted = usize::try_from(value).ok();
    if converted.is_none() {
        log::warn!("{}: invalid {} {}", op, name, value);
    }
    converted
}

fn pid_arg(op: &'static str, value: i32) -> Option<Pid> {
    let converted = u32::try_from(value).ok().map(Pid::new);
    if converted.is_none() {
        log::warn!("{}: invalid pid {}", op, value);
    }
    converted
}

/// Global pointers never exceed 128 MiB, so they fit an `i32`.
fn ptr_out(ptr: usize) -> i32 {
    ptr as i32
}

/// Bring up console, heap and kernel.
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn kernel_init() {
    #[cfg(target_arch = "wasm32")]
    crate::console::init(crate::console::host_sink);

    let kernel = kernel();
    let layout = kernel.space().layout();
    crate::println!(
        "[OK] Memory initialized ({} MiB kernel, {} MiB user)",
        layout.kernel_size() / 1024 / 1024,
        layout.user_size() / 1024 / 1024
    );
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn alloc_kernel(size: i32) -> i32 {
    match arg("alloc_kernel", "size", size) {
        Some(size) => ptr_out(kernel().alloc_kernel(size)),
        None => -1,
    }
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn free_kernel(ptr: i32, size: i32) {
    let (Some(ptr), Some(size)) = (arg("free_kernel", "ptr", ptr), arg("free_kernel", "size", size))
    else {
        return;
    };
    let _ = kernel().free_kernel(ptr, size);
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn alloc_user(size: i32, pid: i32) -> i32 {
    match (arg("alloc_user", "size", size), pid_arg("alloc_user", pid)) {
        (Some(size), Some(pid)) => ptr_out(kernel().alloc_user(size, pid)),
        _ => -1,
    }
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn free_user(ptr: i32, size: i32) {
    let (Some(ptr), Some(size)) = (arg("free_user", "ptr", ptr), arg("free_user", "size", size))
    else {
        return;
    };
    let _ = kernel().free_user(ptr, size);
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn read_user(ptr: i32, pid: i32) -> u8 {
    match (arg("read_user", "ptr", ptr), pid_arg("read_user", pid)) {
        (Some(ptr), Some(pid)) => kernel().read_user(ptr, pid),
        _ => 0,
    }
}

/// Dump a block map: 0 = kernel, 1 = user.
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn dump_map(selector: i32) {
    match Region::from_selector(selector) {
        Some(region) => {
            kernel().dump_map(region);
        }
        None => log::warn!("invalid heap: {}", selector),
    }
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn load_u32(addr: i32) -> u32 {
    arg("load_u32", "address", addr)
        .and_then(|addr| kernel().space().load_u32(addr).ok())
        .unwrap_or(0)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn store_u32(addr: i32, value: u32) {
    if let Some(addr) = arg("store_u32", "address", addr) {
        let _ = kernel().space_mut().store_u32(addr, value);
    }
}

/// Spawn a process; -1 once the process table is full.
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn spawn_process(size: i32, entry: i32) -> i32 {
    let (Some(size), Some(entry)) =
        (arg("spawn_process", "size", size), arg("spawn_process", "entry", entry))
    else {
        return -1;
    };
    match kernel().spawn(size, entry) {
        Ok(pid) => pid.raw() as i32,
        Err(_) => -1,
    }
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn kill_process(pid: i32) {
    if let Some(pid) = pid_arg("kill_process", pid) {
        let _ = kernel().kill(pid);
    }
}

/// State of a process as its discriminant; -1 when absent.
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn process_state(pid: i32) -> i32 {
    pid_arg("process_state", pid)
        .and_then(|pid| kernel().lookup(pid))
        .map_or(-1, |process| process.state as i32)
}
