use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::bitmap::{
    self, find_free_blocks, find_free_inode, init_bitmaps, mark_block, mark_inode, reclaimable_blocks, release,
};
use crate::block_dev::BlockDevice;
use crate::block_store::BlockStore;
use crate::check::{self, CheckReport};
use crate::config::*;
use crate::directory::{dir_entries, dir_lookup, find_free_dir_slot, init_dir_table, write_dir_entry};
use crate::error::{Capacity, FsError, Result};
use crate::file::{fread, fwrite};
use crate::image;
use crate::inode::{get_inode, init_inode_table, write_inode};
use crate::structs::*;

/// What `list` and `stat` report about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub attributes: Attributes,
    pub modified: SystemTime,
    pub inode: u32,
}

impl FileInfo {
    pub fn is_hidden(&self) -> bool {
        self.attributes.contains(Attributes::HIDDEN)
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(Attributes::READ_ONLY)
    }
}

/// One in-memory volume: the whole block array with its metadata tables.
///
/// All methods take `&self`/`&mut self` and run to completion. The type holds
/// mutable state without internal locking, so sharing it across threads
/// requires external synchronization.
pub struct FileSystem {
    disk: BlockStore,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Checks a caller-supplied name and returns its bytes.
fn validate_name(name: &str) -> Result<&[u8]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.contains(&0) {
        return Err(FsError::InvalidFileName);
    }
    if bytes.len() > MAX_FILE_NAME_LEN {
        return Err(FsError::NameTooLong);
    }
    Ok(bytes)
}

fn format_store(store: &mut BlockStore) {
    store.clear();
    init_dir_table(store);
    init_bitmaps(store);
    init_inode_table(store);
}

impl FileSystem {
    /// A freshly formatted volume: no files, the whole data pool free.
    pub fn new() -> Self {
        let mut store = BlockStore::zeroed();
        format_store(&mut store);
        Self { disk: store }
    }

    /// Reads a whole image from `device`.
    pub fn load(device: &impl BlockDevice) -> Result<Self> {
        let mut store = BlockStore::zeroed();
        image::load(&mut store, device)?;
        Ok(Self { disk: store })
    }

    /// Writes the whole volume, reserved region included, to `device`.
    pub fn save(&self, device: &impl BlockDevice) -> Result<()> {
        image::save(&self.disk, device)
    }

    /// Returns to the freshly formatted state.
    pub fn reset(&mut self) {
        format_store(&mut self.disk);
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.disk
    }

    /// Cross-checks bitmaps against the directory and inode tables.
    pub fn check(&self) -> CheckReport {
        check::check(&self.disk)
    }

    /// Creates `name` or replaces its contents with exactly `size` bytes read
    /// from `source`.
    ///
    /// Nothing is modified unless the whole call succeeds: the new blocks are
    /// chosen and the source is read in full before old blocks are released.
    pub fn store(&mut self, name: &str, mut source: impl Read, size: u64) -> Result<()> {
        let name = validate_name(name)?;

        let (slot, inode_id, mut inode) = match dir_lookup(&self.disk, name) {
            Some((slot, entry)) => {
                let inode_id = entry.inode.ok_or(FsError::NotFound)?;
                let inode = get_inode(&self.disk, inode_id)?;
                if inode.is_read_only() {
                    return Err(FsError::PermissionDenied);
                }
                (slot, inode_id, inode)
            }
            None => {
                let slot = find_free_dir_slot(&self.disk)
                    .ok_or(FsError::CapacityExceeded(Capacity::OutOfEntries))?;
                let inode_id = find_free_inode(&self.disk)
                    .ok_or(FsError::CapacityExceeded(Capacity::OutOfInodes))?;
                (slot, inode_id, Inode::empty())
            }
        };

        if size > MAX_FILE_SIZE as u64 {
            return Err(FsError::CapacityExceeded(Capacity::FileTooLarge));
        }
        // Blocks the old contents hold come back before the new ones are taken,
        // so the new block list is chosen from both.
        let needed = (size as usize).div_ceil(BLOCK_SIZE);
        let reusable = reclaimable_blocks(&self.disk, &inode);
        let blocks = find_free_blocks(&self.disk, needed, &reusable)
            .ok_or(FsError::CapacityExceeded(Capacity::OutOfSpace))?;

        let mut data = vec![0u8; size as usize];
        source.read_exact(&mut data)?;

        release(&mut self.disk, &mut inode);
        fwrite(&mut self.disk, &mut inode, &blocks, &data);

        for &block_id in &blocks {
            mark_block(&mut self.disk, block_id, true);
        }
        mark_inode(&mut self.disk, inode_id, true);
        write_inode(&mut self.disk, inode_id, &inode)?;
        write_dir_entry(&mut self.disk, slot, &DirEntry::new(name, inode_id, now())?);

        info!(
            "stored {:?}: {} bytes in {} blocks, slot {}, inode {}",
            String::from_utf8_lossy(name),
            size,
            blocks.len(),
            slot,
            inode_id
        );
        Ok(())
    }

    pub fn store_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.store(name, data, data.len() as u64)
    }

    /// Stores the contents of the host file at `path` under `name`.
    pub fn store_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        self.store(name, file, size)
    }

    /// Writes the contents of `name` to `out`. Returns the number of bytes written.
    pub fn retrieve(&self, name: &str, out: &mut impl Write) -> Result<u64> {
        let (_, entry) = dir_lookup(&self.disk, name.as_bytes()).ok_or(FsError::NotFound)?;
        let inode = get_inode(&self.disk, entry.inode.ok_or(FsError::NotFound)?)?;
        let written = fread(&self.disk, &inode, out)?;
        out.flush()?;
        Ok(written)
    }

    pub fn retrieve_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.retrieve(name, &mut out)?;
        Ok(out)
    }

    /// Writes the contents of `name` to a host file at `path`, replacing it.
    pub fn retrieve_to_file(&self, name: &str, path: impl AsRef<Path>) -> Result<u64> {
        // Look up first so a missing name does not leave an empty file behind.
        if dir_lookup(&self.disk, name.as_bytes()).is_none() {
            return Err(FsError::NotFound);
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.retrieve(name, &mut out)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let (slot, entry) = dir_lookup(&self.disk, name.as_bytes()).ok_or(FsError::NotFound)?;
        let inode_id = entry.inode.ok_or(FsError::NotFound)?;
        let mut inode = get_inode(&self.disk, inode_id)?;
        if inode.is_read_only() {
            return Err(FsError::PermissionDenied);
        }

        let released = release(&mut self.disk, &mut inode);
        inode.attributes = Attributes::empty();
        write_inode(&mut self.disk, inode_id, &inode)?;
        mark_inode(&mut self.disk, inode_id, false);
        write_dir_entry(&mut self.disk, slot, &DirEntry::NULL);

        info!("deleted {:?}: {} blocks released, inode {}", name, released, inode_id);
        Ok(())
    }

    /// `Set` turns the chosen bit on and `Clear` turns it off; the other bit is left alone.
    pub fn set_attribute(&mut self, kind: AttributeKind, op: AttributeOp, name: &str) -> Result<()> {
        let (_, entry) = dir_lookup(&self.disk, name.as_bytes()).ok_or(FsError::NotFound)?;
        let inode_id = entry.inode.ok_or(FsError::NotFound)?;
        let mut inode = get_inode(&self.disk, inode_id)?;
        match op {
            AttributeOp::Set => inode.attributes.insert(kind.flag()),
            AttributeOp::Clear => inode.attributes.remove(kind.flag()),
        }
        write_inode(&mut self.disk, inode_id, &inode)?;
        debug!("{:?} {:?} on {:?}, now {:?}", op, kind, name, inode.attributes);
        Ok(())
    }

    /// Free bytes in the data pool, a multiple of BLOCK_SIZE.
    pub fn free_space(&self) -> u64 {
        (bitmap::free_blocks(&self.disk) * BLOCK_SIZE) as u64
    }

    pub fn free_inodes(&self) -> usize {
        bitmap::free_inodes(&self.disk)
    }

    pub fn free_entries(&self) -> usize {
        MAX_FILE_NUM - dir_entries(&self.disk).count()
    }

    fn info(&self, entry: &DirEntry) -> Result<FileInfo> {
        let inode_id = entry.inode.ok_or(FsError::NotFound)?;
        let inode = get_inode(&self.disk, inode_id)?;
        Ok(FileInfo {
            name: String::from_utf8_lossy(entry.name()).into_owned(),
            size: inode.size as u64,
            attributes: inode.attributes,
            modified: UNIX_EPOCH + Duration::from_secs(entry.modified),
            inode: inode_id,
        })
    }

    pub fn stat(&self, name: &str) -> Result<FileInfo> {
        let (_, entry) = dir_lookup(&self.disk, name.as_bytes()).ok_or(FsError::NotFound)?;
        self.info(&entry)
    }

    /// Files in directory-slot order. Hidden files are included only when `show_hidden` is set.
    pub fn list(&self, show_hidden: bool) -> Result<Vec<FileInfo>> {
        let mut files = Vec::new();
        for (_, entry) in dir_entries(&self.disk) {
            let info = self.info(&entry)?;
            if show_hidden || !info.is_hidden() {
                files.push(info);
            }
        }
        Ok(files)
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
