pub const BLOCK_SIZE: usize = 8192;
pub const BLOCK_NUM: usize = 4226;
pub const IMAGE_SIZE: u64 = (BLOCK_NUM * BLOCK_SIZE) as u64; // Exact byte size of an image file

pub const MAX_FILE_NUM: usize = 128; // Number of directory entries and inodes
pub const INODE_BLOCK_NUM: usize = 1250; // Direct block pointers per inode
pub const MAX_FILE_SIZE: usize = INODE_BLOCK_NUM * BLOCK_SIZE;

pub const RESERVED_BLOCKS: usize = 128; // Blocks [0, 128) never hold file data
pub const DATA_START: usize = RESERVED_BLOCKS;

pub const MAX_FILE_NAME_LEN: usize = 32; // Longest name accepted by store
pub const NAME_FIELD_LEN: usize = 255; // On-disk name field, NUL padded

// Encoded record sizes, see structs.rs for the field layout.
pub const DIR_ENTRY_SIZE: usize = 1 + NAME_FIELD_LEN + 4 + 8;
pub const INODE_SIZE: usize = 4 + INODE_BLOCK_NUM * 4 + 4;

pub const DIR_TABLE_START: usize = 0;
pub const DIR_TABLE_BLOCKS: usize = 7;
pub const INODE_BITMAP_BLOCK: usize = 7;
pub const BLOCK_BITMAP_BLOCK: usize = 8;
pub const INODE_TABLE_START: usize = 9;
pub const INODE_TABLE_BLOCKS: usize = (MAX_FILE_NUM * INODE_SIZE).div_ceil(BLOCK_SIZE);

/// On-disk marker for an empty block or inode reference.
pub const NO_REF: u32 = u32::MAX;

const _: () = assert!(MAX_FILE_NUM * DIR_ENTRY_SIZE <= DIR_TABLE_BLOCKS * BLOCK_SIZE);
const _: () = assert!(DIR_TABLE_START + DIR_TABLE_BLOCKS <= INODE_BITMAP_BLOCK);
const _: () = assert!(MAX_FILE_NUM <= BLOCK_SIZE);
const _: () = assert!(BLOCK_NUM <= BLOCK_SIZE);
const _: () = assert!(INODE_TABLE_START + INODE_TABLE_BLOCKS <= RESERVED_BLOCKS);
const _: () = assert!(MAX_FILE_SIZE <= u32::MAX as usize);
