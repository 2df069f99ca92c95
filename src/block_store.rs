//! The raw block array every other layer reads and writes.
//! Blocks [0, RESERVED_BLOCKS) carry the metadata tables and bitmaps,
//! the rest is the data pool.

use crate::config::*;

#[derive(Clone)]
pub struct BlockStore {
    bytes: Vec<u8>,
}

impl BlockStore {
    /// A zero-filled store of `BLOCK_NUM` blocks.
    pub fn zeroed() -> Self {
        Self {
            bytes: vec![0u8; BLOCK_NUM * BLOCK_SIZE],
        }
    }

    pub fn num_blocks(&self) -> usize {
        BLOCK_NUM
    }

    /// Panics if `block_id` is out of range; callers index with ids the
    /// allocator or the fixed layout produced.
    pub fn block(&self, block_id: usize) -> &[u8] {
        let start = block_id * BLOCK_SIZE;
        &self.bytes[start..start + BLOCK_SIZE]
    }

    pub fn block_mut(&mut self, block_id: usize) -> &mut [u8] {
        let start = block_id * BLOCK_SIZE;
        &mut self.bytes[start..start + BLOCK_SIZE]
    }

    /// A byte range spanning `blocks` consecutive blocks starting at `start_block`.
    /// Metadata tables are addressed this way since their records straddle block boundaries.
    pub fn region(&self, start_block: usize, blocks: usize) -> &[u8] {
        &self.bytes[start_block * BLOCK_SIZE..(start_block + blocks) * BLOCK_SIZE]
    }

    pub fn region_mut(&mut self, start_block: usize, blocks: usize) -> &mut [u8] {
        &mut self.bytes[start_block * BLOCK_SIZE..(start_block + blocks) * BLOCK_SIZE]
    }

    /// Zeroes every block.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}
