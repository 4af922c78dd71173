//! Property tests for the region allocator and address space.
//!
//! A shadow list of live allocations is kept next to the allocator; after
//! every step the block map must agree with it exactly.

use alloc::vec::Vec;
use proptest::prelude::*;

use super::{AddressSpace, BlockState, Layout, Region, RegionAllocator};
use crate::task::Pid;

const REGION_SIZE: usize = 256;
const BLOCK: usize = 4;

#[derive(Debug, Clone)]
enum UserOp {
    Alloc { size: usize, pid: u32 },
    Free(usize),
}

fn arb_user_ops() -> impl Strategy<Value = Vec<UserOp>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..40, 0u32..4).prop_map(|(size, pid)| UserOp::Alloc { size, pid }),
            any::<usize>().prop_map(UserOp::Free),
        ],
        1..64,
    )
}

/// Every user block has an owner exactly when it is marked used.
fn owners_match_occupancy(space: &AddressSpace) -> Result<(), TestCaseError> {
    let user = space.region(Region::User);
    for block in 0..user.map().len() {
        prop_assert_eq!(
            space.owners().owner_of(block).is_some(),
            user.map().is_used(block),
            "block {}",
            block
        );
    }
    prop_assert_eq!(space.owners().len(), user.used_blocks());
    Ok(())
}

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..48).prop_map(Op::Alloc),
            any::<usize>().prop_map(Op::Free),
        ],
        1..64,
    )
}

/// Expected map: used exactly where a live allocation lies.
fn expected_map(live: &[(usize, usize)]) -> Vec<BlockState> {
    let mut map = alloc::vec![BlockState::Free; REGION_SIZE / BLOCK];
    for &(ptr, size) in live {
        let start = ptr / BLOCK;
        for entry in &mut map[start..start + size.div_ceil(BLOCK)] {
            *entry = BlockState::Used;
        }
    }
    map
}

/// Lowest block index starting a free run of `required` blocks.
fn reference_first_fit(map: &[BlockState], required: usize) -> Option<usize> {
    (0..map.len()).find(|&start| {
        map[start] == BlockState::Free
            && start + required <= map.len()
            && map[start..start + required].iter().all(|b| *b == BlockState::Free)
    })
}

proptest! {
    #[test]
    fn map_tracks_live_allocations(ops in arb_ops()) {
        let mut region = RegionAllocator::new(Region::Kernel, REGION_SIZE, BLOCK, BLOCK);
        let mut live: Vec<(usize, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    let required = size.div_ceil(BLOCK);
                    let map: Vec<_> = region.map().iter().collect();
                    let Some(expected) = reference_first_fit(&map, required) else {
                        // Would be fatal; stop the sequence here.
                        break;
                    };
                    let ptr = region.allocate(size);
                    prop_assert_eq!(ptr, expected * BLOCK);
                    prop_assert_eq!(ptr % BLOCK, 0);
                    if required > 0 {
                        live.push((ptr, size));
                    }
                }
                Op::Free(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let (ptr, size) = live.remove(pick % live.len());
                    prop_assert!(region.free(ptr, size).is_ok());
                }
            }
            let actual: Vec<_> = region.map().iter().collect();
            prop_assert_eq!(actual, expected_map(&live));
        }
    }

    #[test]
    fn invalid_free_changes_nothing(
        sizes in prop::collection::vec(1usize..32, 1..8),
        bad in REGION_SIZE..usize::MAX,
        len in any::<usize>(),
    ) {
        let mut region = RegionAllocator::new(Region::User, REGION_SIZE, BLOCK, BLOCK);
        for size in sizes {
            let ptr = region.allocate(size);
            region.bytes_mut()[ptr] = 0xee;
        }
        let map_before: Vec<_> = region.map().iter().collect();
        let bytes_before = region.bytes().to_vec();

        prop_assert!(region.free(bad, len).is_err());
        prop_assert_eq!(region.map().iter().collect::<Vec<_>>(), map_before);
        prop_assert_eq!(region.bytes(), &bytes_before[..]);
    }

    #[test]
    fn ownership_follows_user_occupancy(ops in arb_user_ops()) {
        let mut space = AddressSpace::new(Layout::with_sizes(64, REGION_SIZE).unwrap());
        let mut live: Vec<(usize, usize, Pid)> = Vec::new();

        for op in ops {
            match op {
                UserOp::Alloc { size, pid } => {
                    let required = size.div_ceil(BLOCK);
                    let map: Vec<_> = space.region(Region::User).map().iter().collect();
                    if reference_first_fit(&map, required).is_none() {
                        break;
                    }
                    let pid = Pid::new(pid);
                    let ptr = space.alloc_user(size, pid);
                    if required > 0 {
                        live.push((ptr, size, pid));
                    }
                }
                UserOp::Free(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let (ptr, size, pid) = live.remove(pick % live.len());
                    prop_assert!(space.free_user(ptr, size).is_ok());
                    let still_owns = live.iter().any(|(_, _, p)| *p == pid);
                    prop_assert_eq!(space.owners().owns_any(pid), still_owns);
                }
            }
            owners_match_occupancy(&space)?;
        }
    }

    #[test]
    fn user_free_zeroes_every_freed_byte(size in 1usize..64, fill in 1u8..=255) {
        let mut space = AddressSpace::new(Layout::with_sizes(64, REGION_SIZE).unwrap());
        let pid = Pid::new(0);
        let _keep = space.alloc_user(4, pid);
        let ptr = space.alloc_user(size, pid);
        for addr in ptr..ptr + size {
            space.store_u8(addr, fill).unwrap();
        }

        space.free_user(ptr, size).unwrap();
        for addr in ptr..ptr + size {
            prop_assert_eq!(space.read_user(addr, pid), 0);
        }
    }
}
