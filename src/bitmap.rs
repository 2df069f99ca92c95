//! Management of the block bitmap and inode bitmap.
//! Both use one byte per tracked item: 1 for in use, 0 for free.
//! Allocation is always first fit from the lowest index.

use log::{debug, warn};

use crate::block_store::BlockStore;
use crate::config::*;
use crate::structs::Inode;

struct Bitmap {
    block_id: usize,
    items: usize,
}

const INODE_BITMAP: Bitmap = Bitmap {
    block_id: INODE_BITMAP_BLOCK,
    items: MAX_FILE_NUM,
};

const BLOCK_BITMAP: Bitmap = Bitmap {
    block_id: BLOCK_BITMAP_BLOCK,
    items: BLOCK_NUM,
};

impl Bitmap {
    fn is_set(&self, store: &BlockStore, item_id: usize) -> bool {
        item_id < self.items && store.block(self.block_id)[item_id] != 0
    }

    /// Returns previously set value of the bit.
    fn set(&self, store: &mut BlockStore, item_id: usize, value: bool) -> bool {
        debug_assert!(item_id < self.items);
        let slot = &mut store.block_mut(self.block_id)[item_id];
        let prev = *slot != 0;
        *slot = value as u8;
        prev
    }

    /// First clear item at or after `from`.
    fn first_clear(&self, store: &BlockStore, from: usize) -> Option<usize> {
        let map = &store.block(self.block_id)[..self.items];
        (from..self.items).find(|&i| map[i] == 0)
    }

    fn count_clear(&self, store: &BlockStore, from: usize) -> usize {
        store.block(self.block_id)[from..self.items]
            .iter()
            .filter(|&&b| b == 0)
            .count()
    }
}

/// Lays down the bitmaps of a freshly formatted volume:
/// every inode free, reserved blocks in use, data pool free.
pub fn init_bitmaps(store: &mut BlockStore) {
    store.block_mut(INODE_BITMAP_BLOCK).fill(0);
    let map = store.block_mut(BLOCK_BITMAP_BLOCK);
    map.fill(0);
    map[..RESERVED_BLOCKS].fill(1);
}

/// Lowest free data block, or None if the pool is exhausted.
pub fn find_free_block(store: &BlockStore) -> Option<u32> {
    BLOCK_BITMAP.first_clear(store, DATA_START).map(|id| id as u32)
}

/// The `count` lowest free data blocks, without marking any of them.
/// Blocks in `reusable` count as free even though they are marked in use;
/// it must be sorted. Returns None if the pool cannot supply that many.
pub fn find_free_blocks(store: &BlockStore, count: usize, reusable: &[u32]) -> Option<Vec<u32>> {
    let found: Vec<u32> = (DATA_START..BLOCK_NUM)
        .filter(|&id| !BLOCK_BITMAP.is_set(store, id) || reusable.binary_search(&(id as u32)).is_ok())
        .take(count)
        .map(|id| id as u32)
        .collect();
    (found.len() == count).then_some(found)
}

/// Blocks of `inode` that `release` would actually give back:
/// inside the data pool and marked in use. Sorted, without duplicates.
pub fn reclaimable_blocks(store: &BlockStore, inode: &Inode) -> Vec<u32> {
    let mut ids: Vec<u32> = inode
        .block_ids()
        .filter(|&id| (DATA_START..BLOCK_NUM).contains(&(id as usize)) && block_in_use(store, id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Lowest free inode, or None if all are taken.
pub fn find_free_inode(store: &BlockStore) -> Option<u32> {
    INODE_BITMAP.first_clear(store, 0).map(|id| id as u32)
}

pub fn block_in_use(store: &BlockStore, block_id: u32) -> bool {
    BLOCK_BITMAP.is_set(store, block_id as usize)
}

pub fn inode_in_use(store: &BlockStore, inode_id: u32) -> bool {
    INODE_BITMAP.is_set(store, inode_id as usize)
}

/// Marks a data block used or free. Reserved blocks are never touched.
pub fn mark_block(store: &mut BlockStore, block_id: u32, in_use: bool) {
    let id = block_id as usize;
    if !(DATA_START..BLOCK_NUM).contains(&id) {
        warn!("refusing to mark block {} outside the data pool", id);
        return;
    }
    let prev = BLOCK_BITMAP.set(store, id, in_use);
    if prev == in_use {
        debug!("block {} already {}", id, if in_use { "in use" } else { "free" });
    }
}

pub fn mark_inode(store: &mut BlockStore, inode_id: u32, in_use: bool) {
    let id = inode_id as usize;
    if id >= MAX_FILE_NUM {
        warn!("refusing to mark inode {} out of range", id);
        return;
    }
    INODE_BITMAP.set(store, id, in_use);
}

/// Number of free blocks in the data pool.
pub fn free_blocks(store: &BlockStore) -> usize {
    BLOCK_BITMAP.count_clear(store, DATA_START)
}

pub fn free_inodes(store: &BlockStore) -> usize {
    INODE_BITMAP.count_clear(store, 0)
}

/// Gives back every block referenced by `inode` and empties it.
/// Only the in-memory inode is changed; writing it back is the caller's job.
/// Calling it again on the same inode does nothing.
/// Returns the number of blocks released.
pub fn release(store: &mut BlockStore, inode: &mut Inode) -> usize {
    let mut released = 0;
    for slot in inode.blocks.iter_mut() {
        if let Some(block_id) = slot.take() {
            mark_block(store, block_id, false);
            released += 1;
        }
    }
    inode.size = 0;
    if released > 0 {
        debug!("released {} blocks", released);
    }
    released
}
