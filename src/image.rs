//! Whole-volume persistence: an image is the block array written out
//! block by block, nothing more.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::block_dev::BlockDevice;
use crate::block_store::BlockStore;
use crate::config::*;
use crate::error::{FsError, Result};

/// A host file holding exactly one volume image.
#[derive(Debug)]
pub struct ImageFile {
    file: File,
}

impl ImageFile {
    /// Creates (or truncates) the file at `path`, sized to hold one image.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(IMAGE_SIZE)?;
        Ok(Self { file })
    }

    /// Opens an existing image for reading and writing.
    /// Its length must be exactly IMAGE_SIZE.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let actual = file.metadata()?.len();
        if actual != IMAGE_SIZE {
            return Err(FsError::InvalidImage {
                expected: IMAGE_SIZE,
                actual,
            });
        }
        Ok(Self { file })
    }

    fn seek_to(&self, block_id: usize) -> Result<()> {
        if block_id >= BLOCK_NUM {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block id past the end of the image",
            )));
        }
        (&self.file).seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))?;
        Ok(())
    }
}

impl BlockDevice for ImageFile {
    fn num_blocks(&self) -> usize {
        BLOCK_NUM
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        self.seek_to(block_id)?;
        (&self.file).read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<()> {
        self.seek_to(block_id)?;
        (&self.file).write_all(buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        (&self.file).flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

fn check_geometry(device: &impl BlockDevice) -> Result<()> {
    if device.num_blocks() != BLOCK_NUM || device.block_size() != BLOCK_SIZE {
        return Err(FsError::InvalidImage {
            expected: IMAGE_SIZE,
            actual: device.capacity(),
        });
    }
    Ok(())
}

/// Writes every block of `store` to `device`, then flushes it.
pub fn save(store: &BlockStore, device: &impl BlockDevice) -> Result<()> {
    check_geometry(device)?;
    for block_id in 0..store.num_blocks() {
        device.write_block(block_id, store.block(block_id))?;
    }
    device.flush()?;
    debug!("saved {} blocks", store.num_blocks());
    Ok(())
}

/// Replaces the whole of `store` with the contents of `device`.
/// On error `store` may hold a mix of old and new blocks; callers load into a scratch store.
pub fn load(store: &mut BlockStore, device: &impl BlockDevice) -> Result<()> {
    check_geometry(device)?;
    for block_id in 0..store.num_blocks() {
        device.read_block(block_id, store.block_mut(block_id))?;
    }
    debug!("loaded {} blocks", store.num_blocks());
    Ok(())
}
