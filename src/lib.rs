//! Flatfs is a single-volume file store simulated on a fixed array of blocks.
//! Files live in one flat directory and address their data through direct
//! block pointers only.
//!
//! Flatfs' block layout:
//! - Blocks 0..7:    directory-entry table (MAX_FILE_NUM entries)
//! - Block 7:        inode bitmap
//! - Block 8:        block bitmap
//! - Blocks 9..88:   inode table (MAX_FILE_NUM inodes)
//! - Blocks 88..128: reserved, unused
//! - Blocks 128..:   data pool
//!
//! Flatfs' layers (from bottom to top):
//! 1. BlockStore: the in-memory block array.
//! 2. Bitmap: first-fit allocation and release of blocks and inodes.
//! 3. Inode / Directory: the metadata tables inside the reserved region.
//! 4. File: copying contents between callers and data blocks.
//! 5. FileSystem: store, retrieve, delete, attributes, free space, listing.
//! 6. Volume: format, open and close of an image file around a FileSystem.
//!
//! Images travel through the [`BlockDevice`] trait; [`ImageFile`] is the host-file
//! implementation.

mod config;
mod block_dev;
mod block_store;
mod structs;
mod bitmap;
mod inode;
mod directory;
mod file;
mod check;
mod image;
mod fs;
mod volume;
mod error;

pub use block_dev::BlockDevice;
pub use block_store::BlockStore;
pub use bitmap::{find_free_block, find_free_inode};
pub use config::*;
pub use structs::*;
pub use check::CheckReport;
pub use image::{load, save, ImageFile};
pub use fs::*;
pub use volume::Volume;
pub use error::{Capacity, FsError};
pub use error::FsError as Error;
pub use error::Result;
