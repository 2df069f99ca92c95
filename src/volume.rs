//! The "one active volume" lifecycle around a [`FileSystem`].
//!
//! ```text
//!   Closed --open--> Open --close--> Closed
//! ```
//!
//! File operations are only available while a volume is open. Closing writes
//! the whole block array back to the image and resets the in-memory state.

use std::io::{Read, Write};
use std::path::Path;

use log::{info, warn};

use crate::check::CheckReport;
use crate::error::{FsError, Result};
use crate::fs::{FileInfo, FileSystem};
use crate::image::ImageFile;
use crate::structs::{AttributeKind, AttributeOp};

/// Holds one mutable in-process volume; not safe for concurrent use
/// without external synchronization.
pub struct Volume {
    fs: FileSystem,
    image: Option<ImageFile>,
}

impl Volume {
    /// A closed volume with fresh in-memory state.
    pub fn new() -> Self {
        Self {
            fs: FileSystem::new(),
            image: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Writes a freshly formatted image to `path`. Only valid while closed,
    /// when the in-memory state is always the formatted one.
    pub fn format(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_open() {
            return Err(FsError::AlreadyOpen);
        }
        let path = path.as_ref();
        let image = ImageFile::create(path)?;
        self.fs.save(&image)?;
        info!("formatted {}", path.display());
        Ok(())
    }

    /// Loads the image at `path` wholesale and keeps it open for `close`.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_open() {
            return Err(FsError::AlreadyOpen);
        }
        let path = path.as_ref();
        let image = ImageFile::open(path)?;
        self.fs = FileSystem::load(&image)?;
        self.image = Some(image);

        let report = self.fs.check();
        if !report.is_clean() {
            warn!("{} opened with inconsistencies: {:?}", path.display(), report);
        }
        info!("opened {}, {} bytes free", path.display(), self.fs.free_space());
        Ok(())
    }

    /// Writes the in-memory state back to the open image without closing it.
    pub fn sync(&mut self) -> Result<()> {
        let image = self.image.as_ref().ok_or(FsError::NotOpen)?;
        self.fs.save(image)?;
        info!("synced volume");
        Ok(())
    }

    /// Writes the in-memory state back, releases the image and resets to the
    /// formatted state. If the write fails the volume stays open and unchanged.
    pub fn close(&mut self) -> Result<()> {
        let image = self.image.as_ref().ok_or(FsError::NotOpen)?;
        self.fs.save(image)?;
        self.image = None;
        self.fs.reset();
        info!("closed volume");
        Ok(())
    }

    fn fs(&self) -> Result<&FileSystem> {
        match self.image {
            Some(_) => Ok(&self.fs),
            None => Err(FsError::NotOpen),
        }
    }

    fn fs_mut(&mut self) -> Result<&mut FileSystem> {
        match self.image {
            Some(_) => Ok(&mut self.fs),
            None => Err(FsError::NotOpen),
        }
    }

    pub fn store(&mut self, name: &str, source: impl Read, size: u64) -> Result<()> {
        self.fs_mut()?.store(name, source, size)
    }

    pub fn store_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.fs_mut()?.store_bytes(name, data)
    }

    pub fn store_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        self.fs_mut()?.store_file(name, path)
    }

    pub fn retrieve(&self, name: &str, out: &mut impl Write) -> Result<u64> {
        self.fs()?.retrieve(name, out)
    }

    pub fn retrieve_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        self.fs()?.retrieve_to_vec(name)
    }

    pub fn retrieve_to_file(&self, name: &str, path: impl AsRef<Path>) -> Result<u64> {
        self.fs()?.retrieve_to_file(name, path)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.fs_mut()?.delete(name)
    }

    pub fn set_attribute(&mut self, kind: AttributeKind, op: AttributeOp, name: &str) -> Result<()> {
        self.fs_mut()?.set_attribute(kind, op, name)
    }

    pub fn free_space(&self) -> Result<u64> {
        Ok(self.fs()?.free_space())
    }

    pub fn list(&self, show_hidden: bool) -> Result<Vec<FileInfo>> {
        self.fs()?.list(show_hidden)
    }

    pub fn stat(&self, name: &str) -> Result<FileInfo> {
        self.fs()?.stat(name)
    }

    pub fn check(&self) -> Result<CheckReport> {
        Ok(self.fs()?.check())
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}
