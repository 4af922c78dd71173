//! Kernel configuration.
//!
//! The host always runs [`Config::DEFAULT`]; other configurations exist so
//! tests and tools can build small, independent kernels.

use crate::memory::Layout;
use crate::task::table::MAX_PROCESSES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub layout: Layout,
    /// Process table slots, and therefore the number of pids ever issued.
    pub max_processes: usize,
}

impl Config {
    pub const DEFAULT: Config = Config {
        layout: Layout::DEFAULT,
        max_processes: MAX_PROCESSES,
    };

    pub fn with_layout(layout: Layout) -> Self {
        Config { layout, ..Self::DEFAULT }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}
