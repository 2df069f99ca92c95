//! Common utilities for tests

#![allow(dead_code)]

use std::io::{self, Read};
use std::sync::Mutex;

use flatfs::{BlockDevice, Error, Result, BLOCK_NUM, BLOCK_SIZE};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

/// Deterministic, non-repeating-per-block test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| ((i / 7) as u8).wrapping_mul(31).wrapping_add(seed ^ i as u8)).collect()
}

/// An in-memory block device. Optionally fails every write after `write_budget` blocks.
pub struct RamDisk {
    inner: Mutex<Vec<u8>>,
    num_blocks: usize,
    write_budget: Mutex<Option<usize>>,
}

impl RamDisk {
    /// Creates a new RamDisk with the specified number of blocks.
    /// Each block is BLOCK_SIZE bytes.
    pub fn new(num_blocks: usize) -> Self {
        RamDisk {
            inner: Mutex::new(vec![0u8; num_blocks * BLOCK_SIZE]),
            num_blocks,
            write_budget: Mutex::new(None),
        }
    }

    /// A disk with the geometry of a full volume.
    pub fn volume_sized() -> Self {
        Self::new(BLOCK_NUM)
    }

    pub fn fail_writes_after(self, blocks: usize) -> Self {
        *self.write_budget.lock().unwrap() = Some(blocks);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }
}

fn out_of_range(block_id: usize) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("block {} out of range", block_id),
    ))
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id));
        }
        let start = block_id * BLOCK_SIZE;
        let data = self.inner.lock().unwrap();
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id));
        }
        if let Some(budget) = self.write_budget.lock().unwrap().as_mut() {
            if *budget == 0 {
                return Err(Error::Io(io::Error::new(io::ErrorKind::WriteZero, "disk full")));
            }
            *budget -= 1;
        }
        let start = block_id * BLOCK_SIZE;
        let mut data = self.inner.lock().unwrap();
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // In a RAM disk, flushing is a no-op since data is already in memory.
        Ok(())
    }
}

/// Yields `good` bytes of data, then fails.
pub struct FailingReader {
    pub good: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "source went away"));
        }
        let n = buf.len().min(self.good);
        buf[..n].fill(0x5A);
        self.good -= n;
        Ok(n)
    }
}
