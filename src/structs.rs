//! Directory entries, inodes and their fixed little-endian byte layout.
//!
//! DirEntry, DIR_ENTRY_SIZE bytes:
//! - valid     u8
//! - name      [u8; NAME_FIELD_LEN], NUL padded
//! - inode     u32, NO_REF when unset
//! - modified  u64, seconds since the Unix epoch
//!
//! Inode, INODE_SIZE bytes:
//! - attribute u8 followed by 3 pad bytes
//! - blocks    [u32; INODE_BLOCK_NUM], NO_REF marks an empty slot
//! - size      u32

use bitflags::bitflags;

use crate::config::*;
use crate::error::{FsError, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0b01;
        const HIDDEN = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Hidden,
    ReadOnly,
}

impl AttributeKind {
    pub fn flag(self) -> Attributes {
        match self {
            AttributeKind::Hidden => Attributes::HIDDEN,
            AttributeKind::ReadOnly => Attributes::READ_ONLY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Set,
    Clear,
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

fn encode_ref(r: Option<u32>) -> [u8; 4] {
    r.unwrap_or(NO_REF).to_le_bytes()
}

fn decode_ref(raw: u32) -> Option<u32> {
    (raw != NO_REF).then_some(raw)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub valid: bool,
    pub name: [u8; NAME_FIELD_LEN],
    pub inode: Option<u32>,
    pub modified: u64,
}

impl DirEntry {
    pub const NULL: Self = Self {
        valid: false,
        name: [0; NAME_FIELD_LEN],
        inode: None,
        modified: 0,
    };

    /// Builds a valid entry. Only checks what the on-disk field can hold;
    /// the shorter user-facing limit is enforced by the store path.
    pub fn new(name: &[u8], inode: u32, modified: u64) -> Result<Self> {
        if name.is_empty() || name.contains(&0) {
            return Err(FsError::InvalidFileName);
        }
        if name.len() > NAME_FIELD_LEN {
            return Err(FsError::NameTooLong);
        }
        let mut field = [0u8; NAME_FIELD_LEN];
        field[..name.len()].copy_from_slice(name);
        Ok(Self {
            valid: true,
            name: field,
            inode: Some(inode),
            modified,
        })
    }

    /// The stored name without its NUL padding.
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_LEN);
        &self.name[..end]
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        self.name() == name
    }

    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), DIR_ENTRY_SIZE);
        buf[0] = self.valid as u8;
        buf[1..1 + NAME_FIELD_LEN].copy_from_slice(&self.name);
        let at = 1 + NAME_FIELD_LEN;
        buf[at..at + 4].copy_from_slice(&encode_ref(self.inode));
        buf[at + 4..at + 12].copy_from_slice(&self.modified.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), DIR_ENTRY_SIZE);
        let mut name = [0u8; NAME_FIELD_LEN];
        name.copy_from_slice(&buf[1..1 + NAME_FIELD_LEN]);
        let at = 1 + NAME_FIELD_LEN;
        Self {
            valid: buf[0] != 0,
            name,
            inode: decode_ref(read_u32(buf, at)),
            modified: read_u64(buf, at + 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub attributes: Attributes,
    pub blocks: Box<[Option<u32>; INODE_BLOCK_NUM]>,
    pub size: u32,
}

impl Inode {
    pub fn empty() -> Self {
        Self {
            attributes: Attributes::empty(),
            blocks: Box::new([None; INODE_BLOCK_NUM]),
            size: 0,
        }
    }

    /// Referenced data blocks in file order, up to the first empty slot.
    pub fn block_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.blocks.iter().map_while(|b| *b)
    }

    pub fn num_blocks(&self) -> usize {
        self.block_ids().count()
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(Attributes::READ_ONLY)
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes.contains(Attributes::HIDDEN)
    }

    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), INODE_SIZE);
        buf[0] = self.attributes.bits();
        buf[1..4].fill(0);
        for (i, block) in self.blocks.iter().enumerate() {
            let at = 4 + i * 4;
            buf[at..at + 4].copy_from_slice(&encode_ref(*block));
        }
        let at = 4 + INODE_BLOCK_NUM * 4;
        buf[at..at + 4].copy_from_slice(&self.size.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), INODE_SIZE);
        let mut inode = Self::empty();
        inode.attributes = Attributes::from_bits_truncate(buf[0]);
        for (i, block) in inode.blocks.iter_mut().enumerate() {
            *block = decode_ref(read_u32(buf, 4 + i * 4));
        }
        inode.size = read_u32(buf, 4 + INODE_BLOCK_NUM * 4);
        inode
    }
}
