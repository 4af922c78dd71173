//! The kernel's address space.
//!
//! Two regions share one global pointer range: kernel memory at
//! `[0, kernel_size)` and user memory at `[kernel_size, total)`. A pointer's
//! region is decided by which side of the boundary it falls on. User
//! allocations are owned by a process; freeing user memory zeroes it and
//! drops the ownership entries.

use alloc::string::String;

use super::{Layout, MemError, Region, RegionAllocator};
use crate::owners::OwnershipTable;
use crate::task::Pid;

/// Number of block map entries in a dump.
pub const DUMP_ENTRIES: usize = 100;

/// Both regions plus the ownership table of the user region.
pub struct AddressSpace {
    layout: Layout,
    kernel: RegionAllocator,
    user: RegionAllocator,
    owners: OwnershipTable,
}

impl AddressSpace {
    pub fn new(layout: Layout) -> Self {
        let block = layout.block_size();
        let align = layout.alignment();
        AddressSpace {
            layout,
            kernel: RegionAllocator::new(Region::Kernel, layout.kernel_size(), block, align),
            user: RegionAllocator::new(Region::User, layout.user_size(), block, align),
            owners: OwnershipTable::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn region(&self, region: Region) -> &RegionAllocator {
        match region {
            Region::Kernel => &self.kernel,
            Region::User => &self.user,
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut RegionAllocator {
        match region {
            Region::Kernel => &mut self.kernel,
            Region::User => &mut self.user,
        }
    }

    pub fn owners(&self) -> &OwnershipTable {
        &self.owners
    }

    /// Global address of a region's first byte.
    pub fn base_of(&self, region: Region) -> usize {
        match region {
            Region::Kernel => 0,
            Region::User => self.layout.user_base(),
        }
    }

    /// Which region a global address falls in.
    pub fn region_of(&self, addr: usize) -> Option<Region> {
        if addr < self.layout.kernel_size() {
            Some(Region::Kernel)
        } else if addr < self.layout.total() {
            Some(Region::User)
        } else {
            None
        }
    }

    // ─── Kernel region ──────────────────────────────────────────

    /// Allocate kernel memory. Panics when the kernel region is exhausted.
    #[track_caller]
    pub fn alloc_kernel(&mut self, size: usize) -> usize {
        self.kernel.allocate(size)
    }

    pub fn free_kernel(&mut self, ptr: usize, size: usize) -> Result<(), MemError> {
        self.kernel.free(ptr, size).map(|_| ())
    }

    // ─── User region ────────────────────────────────────────────

    /// Allocate user memory owned by `pid`, returning its global address.
    ///
    /// Panics when the user region is exhausted.
    #[track_caller]
    pub fn alloc_user(&mut self, size: usize, pid: Pid) -> usize {
        let blocks = self.user.allocate_blocks(size);
        let start = blocks.start;
        for block in blocks {
            self.owners.set(block, pid);
        }
        self.layout.user_base() + start * self.user.block_size()
    }

    /// Free user memory at global address `ptr`.
    ///
    /// The freed blocks are zeroed and lose their owner.
    pub fn free_user(&mut self, ptr: usize, size: usize) -> Result<(), MemError> {
        let Some(offset) = self.user_offset(ptr) else {
            let err = MemError::InvalidFree { op: "free_user", region: Region::User, ptr };
            log::warn!("{}", err);
            return Err(err);
        };
        let blocks = self.user.free(offset, size)?;
        self.user.zero_blocks(blocks.clone());
        for block in blocks {
            self.owners.remove(block);
        }
        Ok(())
    }

    /// Read one user byte on behalf of `pid`.
    ///
    /// The byte is returned if `pid` owns any user block at all, not
    /// necessarily the one at `ptr`. Otherwise, or if `ptr` is not a user
    /// address, the read yields 0.
    pub fn read_user(&self, ptr: usize, pid: Pid) -> u8 {
        let Some(offset) = self.user_offset(ptr) else {
            log::warn!("read_user: {:#x} is not a user address", ptr);
            return 0;
        };
        if !self.owners.owns_any(pid) {
            log::warn!("read_user: process {} owns no user memory", pid);
            return 0;
        }
        self.user.bytes()[offset]
    }

    fn user_offset(&self, ptr: usize) -> Option<usize> {
        match self.region_of(ptr) {
            Some(Region::User) => Some(ptr - self.layout.user_base()),
            _ => None,
        }
    }

    // ─── Diagnostics ────────────────────────────────────────────

    /// Text snapshot of the first block map entries of `region`.
    pub fn dump_occupancy(&self, region: Region) -> String {
        self.region(region).dump(DUMP_ENTRIES)
    }

    // ─── Raw access ─────────────────────────────────────────────

    /// Resolve `len` bytes at global `addr` to a region and offset.
    fn locate(
        &self,
        op: &'static str,
        addr: usize,
        len: usize,
    ) -> Result<(Region, usize), MemError> {
        let located = self.region_of(addr).and_then(|region| {
            let offset = addr - self.base_of(region);
            let end = offset.checked_add(len)?;
            (end <= self.region(region).size()).then_some((region, offset))
        });
        located.ok_or_else(|| {
            let err = MemError::OutOfBounds { op, addr };
            log::warn!("{}", err);
            err
        })
    }

    pub fn load_u8(&self, addr: usize) -> Result<u8, MemError> {
        let (region, offset) = self.locate("load_u8", addr, 1)?;
        Ok(self.region(region).bytes()[offset])
    }

    pub fn store_u8(&mut self, addr: usize, value: u8) -> Result<(), MemError> {
        let (region, offset) = self.locate("store_u8", addr, 1)?;
        self.region_mut(region).bytes_mut()[offset] = value;
        Ok(())
    }

    /// Load a little-endian `u32`.
    pub fn load_u32(&self, addr: usize) -> Result<u32, MemError> {
        let (region, offset) = self.locate("load_u32", addr, 4)?;
        let bytes = &self.region(region).bytes()[offset..offset + 4];
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Store a little-endian `u32`.
    pub fn store_u32(&mut self, addr: usize, value: u32) -> Result<(), MemError> {
        let (region, offset) = self.locate("store_u32", addr, 4)?;
        self.region_mut(region).bytes_mut()[offset..offset + 4]
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
