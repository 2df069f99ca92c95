//! Consistency checking of a loaded volume.
//! Verifies that the bitmaps agree with what the directory and inode tables reference.

use log::warn;

use crate::bitmap::{block_in_use, inode_in_use};
use crate::block_store::BlockStore;
use crate::config::*;
use crate::directory::read_dir_entry;
use crate::inode::get_inode;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Data blocks marked in use that no file references.
    pub orphaned_blocks: Vec<u32>,
    /// Blocks referenced by a file but marked free.
    pub unmarked_blocks: Vec<u32>,
    /// Blocks referenced by more than one file, or twice by one.
    pub shared_blocks: Vec<u32>,
    /// Inodes marked in use that no valid entry points at.
    pub lost_inodes: Vec<u32>,
    /// Human-readable description of every other problem found.
    pub messages: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_blocks.is_empty()
            && self.unmarked_blocks.is_empty()
            && self.shared_blocks.is_empty()
            && self.lost_inodes.is_empty()
            && self.messages.is_empty()
    }
}

pub fn check(store: &BlockStore) -> CheckReport {
    let mut report = CheckReport::default();
    let mut block_owner: Vec<Option<u32>> = vec![None; BLOCK_NUM];
    let mut inode_owner: Vec<Option<usize>> = vec![None; MAX_FILE_NUM];
    let mut names: Vec<Vec<u8>> = Vec::new();

    for id in 0..RESERVED_BLOCKS as u32 {
        if !block_in_use(store, id) {
            report.messages.push(format!("reserved block {} marked free", id));
        }
    }

    for slot in 0..MAX_FILE_NUM {
        let entry = read_dir_entry(store, slot);
        if !entry.valid {
            continue;
        }
        let name = entry.name().to_vec();
        if name.is_empty() || name.len() > MAX_FILE_NAME_LEN {
            report.messages.push(format!("slot {}: bad name length {}", slot, name.len()));
        }
        if names.contains(&name) {
            report.messages.push(format!("slot {}: duplicate name {:?}", slot, String::from_utf8_lossy(&name)));
        }
        names.push(name);

        let inode_id = match entry.inode {
            Some(id) if (id as usize) < MAX_FILE_NUM => id,
            other => {
                report.messages.push(format!("slot {}: bad inode reference {:?}", slot, other));
                continue;
            }
        };
        if let Some(prev) = inode_owner[inode_id as usize].replace(slot) {
            report.messages.push(format!("slots {} and {} share inode {}", prev, slot, inode_id));
        }
        if !inode_in_use(store, inode_id) {
            report.messages.push(format!("slot {}: inode {} marked free", slot, inode_id));
        }

        let Ok(inode) = get_inode(store, inode_id) else {
            continue;
        };
        let blocks: Vec<u32> = inode.block_ids().collect();
        if inode.blocks[blocks.len()..].iter().any(Option::is_some) {
            report.messages.push(format!("inode {}: block after an empty slot", inode_id));
        }
        if blocks.len() != (inode.size as usize).div_ceil(BLOCK_SIZE) {
            report.messages.push(format!(
                "inode {}: size {} does not match {} blocks",
                inode_id,
                inode.size,
                blocks.len()
            ));
        }
        for block_id in blocks {
            if !(DATA_START..BLOCK_NUM).contains(&(block_id as usize)) {
                report.messages.push(format!("inode {}: block {} outside the data pool", inode_id, block_id));
                continue;
            }
            if block_owner[block_id as usize].replace(inode_id).is_some() {
                report.shared_blocks.push(block_id);
            }
            if !block_in_use(store, block_id) {
                report.unmarked_blocks.push(block_id);
            }
        }
    }

    for id in DATA_START..BLOCK_NUM {
        if block_owner[id].is_none() && block_in_use(store, id as u32) {
            report.orphaned_blocks.push(id as u32);
        }
    }
    for id in 0..MAX_FILE_NUM {
        if inode_owner[id].is_none() && inode_in_use(store, id as u32) {
            report.lost_inodes.push(id as u32);
        }
    }

    if !report.is_clean() {
        warn!(
            "check found {} orphaned, {} unmarked, {} shared blocks, {} lost inodes, {} other problems",
            report.orphaned_blocks.len(),
            report.unmarked_blocks.len(),
            report.shared_blocks.len(),
            report.lost_inodes.len(),
            report.messages.len()
        );
    }
    report
}
