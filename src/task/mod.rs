//! Processes.
//!
//! A process is a pid plus one contiguous user region. Nothing here runs
//! it: `entry` is recorded for whoever adds execution later, and `state`
//! only leaves `Ready` when such a consumer moves it.

pub mod table;

pub use table::ProcessTable;

/// Process identifier. Handed out in increasing order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u32);

impl Pid {
    pub const fn new(raw: u32) -> Self {
        Pid(raw)
    }

    /// Get the raw numeric ID.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Slot index in the process table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for Pid {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ProcessState {
    Ready,
    Running,
    Stopped,
    Terminated,
}

/// Snapshot of a process table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
    pub pid: Pid,
    /// Global address of the process's region.
    pub base: usize,
    pub size: usize,
    pub state: ProcessState,
    pub entry: usize,
}

impl Process {
    pub fn new(pid: Pid, base: usize, size: usize, entry: usize) -> Self {
        Process {
            pid,
            base,
            size,
            state: ProcessState::Ready,
            entry,
        }
    }
}

/// Reported process table errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    /// No live process at `pid`.
    NotFound { op: &'static str, pid: Pid },
    /// The pid counter reached the table capacity.
    TableFull { capacity: usize },
}

impl core::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            ProcessError::NotFound { op, pid } => {
                write!(f, "{}: process {} does not exist", op, pid)
            }
            ProcessError::TableFull { capacity } => {
                write!(f, "process table full ({} pids issued)", capacity)
            }
        }
    }
}
