//! The kernel context.
//!
//! Owns one address space and one process table. Every operation the host
//! can reach goes through here, so several kernels can live side by side.

use alloc::string::String;

use crate::config::Config;
use crate::memory::{AddressSpace, MemError, Region};
use crate::task::{Pid, Process, ProcessError, ProcessTable};

pub struct Kernel {
    space: AddressSpace,
    processes: ProcessTable,
}

impl Kernel {
    pub fn new(config: Config) -> Self {
        log::debug!(
            "kernel: {} KiB kernel region, {} KiB user region, {} process slots",
            config.layout.kernel_size() / 1024,
            config.layout.user_size() / 1024,
            config.max_processes
        );
        Kernel {
            space: AddressSpace::new(config.layout),
            processes: ProcessTable::new(config.max_processes),
        }
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut AddressSpace {
        &mut self.space
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    // ─── Memory ─────────────────────────────────────────────────

    #[track_caller]
    pub fn alloc_kernel(&mut self, size: usize) -> usize {
        self.space.alloc_kernel(size)
    }

    pub fn free_kernel(&mut self, ptr: usize, size: usize) -> Result<(), MemError> {
        self.space.free_kernel(ptr, size)
    }

    #[track_caller]
    pub fn alloc_user(&mut self, size: usize, pid: Pid) -> usize {
        self.space.alloc_user(size, pid)
    }

    pub fn free_user(&mut self, ptr: usize, size: usize) -> Result<(), MemError> {
        self.space.free_user(ptr, size)
    }

    pub fn read_user(&self, ptr: usize, pid: Pid) -> u8 {
        self.space.read_user(ptr, pid)
    }

    /// Dump the first block map entries of `region` to the console and
    /// return them.
    pub fn dump_map(&self, region: Region) -> String {
        let dump = self.space.dump_occupancy(region);
        log::info!("{} map: {}", region, dump);
        dump
    }

    // ─── Processes ──────────────────────────────────────────────

    #[track_caller]
    pub fn spawn(&mut self, size: usize, entry: usize) -> Result<Pid, ProcessError> {
        self.processes.spawn(&mut self.space, size, entry)
    }

    pub fn kill(&mut self, pid: Pid) -> Result<(), ProcessError> {
        self.processes.kill(&mut self.space, pid)
    }

    pub fn lookup(&self, pid: Pid) -> Option<Process> {
        self.processes.lookup(pid)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::new(Config::DEFAULT)
    }
}
