//! Management of reading and writing to the inode table.

use log::warn;

use crate::block_store::BlockStore;
use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::Inode;

fn inode_range(inode_id: u32) -> std::ops::Range<usize> {
    let start = inode_id as usize * INODE_SIZE;
    start..start + INODE_SIZE
}

pub fn get_inode(store: &BlockStore, inode_id: u32) -> Result<Inode> {
    if inode_id as usize >= MAX_FILE_NUM {
        warn!("inode {} out of range", inode_id);
        return Err(FsError::NotFound);
    }
    let table = store.region(INODE_TABLE_START, INODE_TABLE_BLOCKS);
    Ok(Inode::decode(&table[inode_range(inode_id)]))
}

pub fn write_inode(store: &mut BlockStore, inode_id: u32, inode: &Inode) -> Result<()> {
    if inode_id as usize >= MAX_FILE_NUM {
        warn!("inode {} out of range", inode_id);
        return Err(FsError::NotFound);
    }
    let table = store.region_mut(INODE_TABLE_START, INODE_TABLE_BLOCKS);
    inode.encode(&mut table[inode_range(inode_id)]);
    Ok(())
}

/// Writes an empty inode into every slot of the table.
pub fn init_inode_table(store: &mut BlockStore) {
    let empty = Inode::empty();
    let table = store.region_mut(INODE_TABLE_START, INODE_TABLE_BLOCKS);
    for inode_id in 0..MAX_FILE_NUM as u32 {
        empty.encode(&mut table[inode_range(inode_id)]);
    }
}
