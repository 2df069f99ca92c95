//! The seam between an in-memory volume and wherever its image is kept.

use crate::config::BLOCK_SIZE;
use crate::error::Result;

pub trait BlockDevice: Send + Sync {
    /// Number of addressable blocks.
    fn num_blocks(&self) -> usize;

    /// Size of each block in bytes.
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Total number of bytes the device holds.
    fn capacity(&self) -> u64 {
        self.num_blocks() as u64 * self.block_size() as u64
    }

    /// Fills `buf` with the contents of block `block_id`.
    /// buf.len() must be equal to block_size().
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()>;

    /// Overwrites block `block_id` with `buf`.
    /// buf.len() must be equal to block_size().
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<()>;

    /// Pushes written blocks down to stable storage.
    fn flush(&self) -> Result<()>;
}
