//! Ownership of user memory.
//!
//! Maps user block indices to the process that allocated them. Keeps a
//! per-process block count alongside so "does this process own anything"
//! does not have to walk the whole table.

use alloc::collections::BTreeMap;

use crate::task::Pid;

/// Sparse map from user block index to owning process.
#[derive(Debug, Default)]
pub struct OwnershipTable {
    owners: BTreeMap<usize, Pid>,
    counts: BTreeMap<Pid, usize>,
}

impl OwnershipTable {
    pub const fn new() -> Self {
        OwnershipTable {
            owners: BTreeMap::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Record `pid` as owner of `block`. Returns the previous owner.
    pub fn set(&mut self, block: usize, pid: Pid) -> Option<Pid> {
        let previous = self.owners.insert(block, pid);
        if let Some(old) = previous {
            self.release(old);
        }
        *self.counts.entry(pid).or_insert(0) += 1;
        previous
    }

    /// Forget the owner of `block`, returning it.
    pub fn remove(&mut self, block: usize) -> Option<Pid> {
        let pid = self.owners.remove(&block)?;
        self.release(pid);
        Some(pid)
    }

    fn release(&mut self, pid: Pid) {
        if let Some(count) = self.counts.get_mut(&pid) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&pid);
            }
        }
    }

    pub fn owner_of(&self, block: usize) -> Option<Pid> {
        self.owners.get(&block).copied()
    }

    /// Whether `pid` owns at least one block anywhere.
    pub fn owns_any(&self, pid: Pid) -> bool {
        self.counts.contains_key(&pid)
    }

    pub fn blocks_owned_by(&self, pid: Pid) -> usize {
        self.counts.get(&pid).copied().unwrap_or(0)
    }

    /// Number of owned blocks.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
