//! Moving file contents between caller buffers and data blocks.

use std::io::{self, Write};

use crate::block_store::BlockStore;
use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::Inode;

/// Copies `data` into `blocks`, one BLOCK_SIZE chunk per block, and records
/// them on `inode` in order. The last chunk may be short; the tail of its
/// block is left as it was.
/// `blocks` must hold exactly `data.len().div_ceil(BLOCK_SIZE)` ids, and
/// `inode` must not reference any blocks yet.
pub fn fwrite(store: &mut BlockStore, inode: &mut Inode, blocks: &[u32], data: &[u8]) {
    debug_assert_eq!(blocks.len(), data.len().div_ceil(BLOCK_SIZE));
    debug_assert_eq!(inode.num_blocks(), 0);

    for (i, (chunk, &block_id)) in data.chunks(BLOCK_SIZE).zip(blocks).enumerate() {
        store.block_mut(block_id as usize)[..chunk.len()].copy_from_slice(chunk);
        inode.blocks[i] = Some(block_id);
    }
    inode.size = data.len() as u32;
}

/// Streams exactly `inode.size` bytes to `out`, block by block.
/// Returns the number of bytes written.
pub fn fread(store: &BlockStore, inode: &Inode, out: &mut impl Write) -> Result<u64> {
    let mut remaining = inode.size as usize;

    for block_id in inode.block_ids() {
        if remaining == 0 {
            break;
        }
        if !(DATA_START..BLOCK_NUM).contains(&(block_id as usize)) {
            return Err(corrupt("inode references a block outside the data pool"));
        }
        let len = remaining.min(BLOCK_SIZE);
        out.write_all(&store.block(block_id as usize)[..len])?;
        remaining -= len;
    }

    if remaining > 0 {
        return Err(corrupt("inode size exceeds its blocks"));
    }
    Ok(inode.size as u64)
}

fn corrupt(msg: &'static str) -> FsError {
    FsError::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_last_block() {
        let mut store = BlockStore::zeroed();
        store.block_mut(131).fill(0xEE);
        let data: Vec<u8> = (0..BLOCK_SIZE + 100).map(|i| (i % 251) as u8).collect();
        let mut inode = Inode::empty();

        fwrite(&mut store, &mut inode, &[130, 131], &data);
        assert_eq!(inode.block_ids().collect::<Vec<_>>(), vec![130, 131]);
        assert_eq!(inode.size as usize, data.len());
        // Tail of the last block is untouched.
        assert_eq!(store.block(131)[100], 0xEE);

        let mut out = Vec::new();
        assert_eq!(fread(&store, &inode, &mut out).unwrap(), data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn empty_file_has_no_blocks() {
        let mut store = BlockStore::zeroed();
        let mut inode = Inode::empty();
        fwrite(&mut store, &mut inode, &[], &[]);
        assert_eq!(inode.num_blocks(), 0);
        let mut out = Vec::new();
        assert_eq!(fread(&store, &inode, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_inode_is_reported() {
        let store = BlockStore::zeroed();
        let mut inode = Inode::empty();
        inode.blocks[0] = Some(200);
        inode.size = BLOCK_SIZE as u32 + 1;
        let mut out = Vec::new();
        assert!(matches!(fread(&store, &inode, &mut out), Err(FsError::Io(_))));
    }

    #[test]
    fn reserved_block_reference_is_reported() {
        let store = BlockStore::zeroed();
        let mut inode = Inode::empty();
        inode.blocks[0] = Some(3);
        inode.size = 10;
        let mut out = Vec::new();
        assert!(fread(&store, &inode, &mut out).is_err());
    }
}
