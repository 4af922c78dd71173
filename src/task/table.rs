//! Fixed-capacity process table.
//!
//! Slots are indexed by pid. Pids come from a counter that only goes up;
//! once it reaches the capacity, spawning fails instead of wrapping.

use alloc::vec;
use alloc::vec::Vec;

use super::{Pid, Process, ProcessError, ProcessState};
use crate::memory::AddressSpace;

/// Default number of process slots.
pub const MAX_PROCESSES: usize = 1024;

pub struct ProcessTable {
    slots: Vec<Option<Process>>,
    next_pid: u32,
}

impl ProcessTable {
    /// Create an empty table with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        ProcessTable {
            slots: vec![None; capacity],
            next_pid: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Spawn a process with a `size`-byte user region.
    ///
    /// Panics if the user region cannot fit `size` bytes, like any other
    /// allocation. A full table is checked first and leaves memory alone.
    #[track_caller]
    pub fn spawn(
        &mut self,
        space: &mut AddressSpace,
        size: usize,
        entry: usize,
    ) -> Result<Pid, ProcessError> {
        let pid = Pid::new(self.next_pid);
        if pid.index() >= self.capacity() {
            let err = ProcessError::TableFull { capacity: self.capacity() };
            log::warn!("{}", err);
            return Err(err);
        }

        let base = space.alloc_user(size, pid);
        self.next_pid += 1;
        self.slots[pid.index()] = Some(Process::new(pid, base, size, entry));
        log::info!("spawned process {} ({} bytes at {:#x})", pid, size, base);
        Ok(pid)
    }

    /// Kill `pid` and free its region.
    pub fn kill(&mut self, space: &mut AddressSpace, pid: Pid) -> Result<(), ProcessError> {
        let Some(process) = self.slots.get_mut(pid.index()).and_then(Option::take) else {
            let err = ProcessError::NotFound { op: "kill", pid };
            log::warn!("{}", err);
            return Err(err);
        };
        // The base came from alloc_user, so this only fails on a corrupt slot.
        if let Err(err) = space.free_user(process.base, process.size) {
            log::error!("kill: process {} region not released: {}", pid, err);
            debug_assert!(false, "kill: {}", err);
        }
        log::info!("killed process {}", pid);
        Ok(())
    }

    /// Snapshot of the process at `pid`, if it is alive.
    pub fn lookup(&self, pid: Pid) -> Option<Process> {
        self.slots.get(pid.index()).copied().flatten()
    }

    /// Move a live process to `state`.
    pub fn set_state(&mut self, pid: Pid, state: ProcessState) -> Result<(), ProcessError> {
        let process = self
            .slots
            .get_mut(pid.index())
            .and_then(Option::as_mut)
            .ok_or(ProcessError::NotFound { op: "set_state", pid })?;
        process.state = state;
        Ok(())
    }

    /// Number of live processes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> + '_ {
        self.slots.iter().flatten()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new(MAX_PROCESSES)
    }
}
