use thiserror::Error;

/// Which limit a rejected store ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    FileTooLarge,
    OutOfSpace,
    OutOfEntries,
    OutOfInodes,
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file")]
    NotFound,
    #[error("file is read-only")]
    PermissionDenied,
    #[error("file name longer than {} bytes", crate::config::MAX_FILE_NAME_LEN)]
    NameTooLong,
    #[error("invalid file name")]
    InvalidFileName,
    #[error("capacity exceeded: {0:?}")]
    CapacityExceeded(Capacity),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid image: expected {expected} bytes, found {actual}")]
    InvalidImage { expected: u64, actual: u64 },
    #[error("a volume is already open")]
    AlreadyOpen,
    #[error("no volume is open")]
    NotOpen,
}

impl FsError {
    /// True for the two volume lifecycle errors.
    pub fn is_volume_state(&self) -> bool {
        matches!(self, FsError::AlreadyOpen | FsError::NotOpen)
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
