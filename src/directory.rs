//! The flat directory table: MAX_FILE_NUM fixed slots, each binding a name to an inode.

use log::warn;

use crate::bitmap::inode_in_use;
use crate::block_store::BlockStore;
use crate::config::*;
use crate::structs::DirEntry;

fn entry_range(slot: usize) -> std::ops::Range<usize> {
    let start = slot * DIR_ENTRY_SIZE;
    start..start + DIR_ENTRY_SIZE
}

/// Panics if `slot >= MAX_FILE_NUM`.
pub fn read_dir_entry(store: &BlockStore, slot: usize) -> DirEntry {
    let table = store.region(DIR_TABLE_START, DIR_TABLE_BLOCKS);
    DirEntry::decode(&table[entry_range(slot)])
}

pub fn write_dir_entry(store: &mut BlockStore, slot: usize, entry: &DirEntry) {
    let table = store.region_mut(DIR_TABLE_START, DIR_TABLE_BLOCKS);
    entry.encode(&mut table[entry_range(slot)]);
}

/// Marks every slot free.
pub fn init_dir_table(store: &mut BlockStore) {
    for slot in 0..MAX_FILE_NUM {
        write_dir_entry(store, slot, &DirEntry::NULL);
    }
}

/// A slot counts as live only when it is flagged valid and points at an
/// in-range inode whose bitmap bit is set.
fn is_live(store: &BlockStore, slot: usize, entry: &DirEntry) -> bool {
    if !entry.valid {
        return false;
    }
    match entry.inode {
        Some(id) if (id as usize) < MAX_FILE_NUM && inode_in_use(store, id) => true,
        _ => {
            warn!("directory slot {} is valid but has no usable inode", slot);
            false
        }
    }
}

/// Live entries in slot order, paired with their slot index.
pub fn dir_entries(store: &BlockStore) -> impl Iterator<Item = (usize, DirEntry)> + '_ {
    (0..MAX_FILE_NUM)
        .map(move |slot| (slot, read_dir_entry(store, slot)))
        .filter(move |(slot, entry)| is_live(store, *slot, entry))
}

/// Exact, case-sensitive match of `name` against live entries.
/// Returns the slot index and its entry.
pub fn dir_lookup(store: &BlockStore, name: &[u8]) -> Option<(usize, DirEntry)> {
    dir_entries(store).find(|(_, entry)| entry.name_eq(name))
}

/// Lowest slot not holding a live entry. A slot flagged valid without a
/// usable inode is free, the same as for `dir_entries` and `dir_lookup`.
pub fn find_free_dir_slot(store: &BlockStore) -> Option<usize> {
    (0..MAX_FILE_NUM).find(|&slot| !is_live(store, slot, &read_dir_entry(store, slot)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{init_bitmaps, mark_inode};

    fn formatted() -> BlockStore {
        let mut store = BlockStore::zeroed();
        init_dir_table(&mut store);
        init_bitmaps(&mut store);
        store
    }

    fn add(store: &mut BlockStore, slot: usize, name: &str, inode: u32) {
        write_dir_entry(store, slot, &DirEntry::new(name.as_bytes(), inode, 0).unwrap());
        mark_inode(store, inode, true);
    }

    #[test]
    fn lookup_is_exact() {
        let mut store = formatted();
        add(&mut store, 0, "Report", 0);
        add(&mut store, 3, "report", 1);

        assert_eq!(dir_lookup(&store, b"Report").map(|(s, _)| s), Some(0));
        assert_eq!(dir_lookup(&store, b"report").map(|(s, _)| s), Some(3));
        assert!(dir_lookup(&store, b"repor").is_none());
        assert!(dir_lookup(&store, b"report ").is_none());
    }

    #[test]
    fn free_slot_scan() {
        let mut store = formatted();
        assert_eq!(find_free_dir_slot(&store), Some(0));
        add(&mut store, 0, "a", 0);
        add(&mut store, 1, "b", 1);
        assert_eq!(find_free_dir_slot(&store), Some(2));
        write_dir_entry(&mut store, 0, &DirEntry::NULL);
        assert_eq!(find_free_dir_slot(&store), Some(0));

        for slot in 0..MAX_FILE_NUM {
            add(&mut store, slot, &format!("f{}", slot), slot as u32);
        }
        assert_eq!(find_free_dir_slot(&store), None);
    }

    #[test]
    fn entries_without_inode_are_skipped() {
        let mut store = formatted();
        // Valid flag set but inode bitmap bit clear.
        write_dir_entry(&mut store, 2, &DirEntry::new(b"ghost", 9, 0).unwrap());
        assert!(dir_lookup(&store, b"ghost").is_none());
        assert_eq!(dir_entries(&store).count(), 0);
    }

    #[test]
    fn slot_without_inode_is_free() {
        let mut store = formatted();
        add(&mut store, 0, "a", 0);
        write_dir_entry(&mut store, 1, &DirEntry::new(b"ghost", 1, 0).unwrap());
        add(&mut store, 2, "c", 2);
        assert_eq!(find_free_dir_slot(&store), Some(1));

        // Once its inode is in use again the slot is taken.
        mark_inode(&mut store, 1, true);
        assert_eq!(find_free_dir_slot(&store), Some(3));
    }

    #[test]
    fn last_slot_fits_the_table() {
        let mut store = formatted();
        add(&mut store, MAX_FILE_NUM - 1, "tail", 7);
        assert_eq!(dir_lookup(&store, b"tail").map(|(s, _)| s), Some(MAX_FILE_NUM - 1));
        let table = store.region(DIR_TABLE_START, DIR_TABLE_BLOCKS);
        assert!(table[MAX_FILE_NUM * DIR_ENTRY_SIZE..].iter().all(|&b| b == 0));
    }
}
