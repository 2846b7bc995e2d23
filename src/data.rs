//! The data region: fixed-size byte blocks, index-aligned with the
//! allocation table.
//!
//! A block's fill is the position of its first zero byte; the format
//! stores no per-block length. Writing a zero byte therefore shortens
//! the block's apparent content (see the crate docs).

use crate::config::{BLOCK_SIZE, TABLE_SIZE};
use crate::error::{FsError, Result};
use crate::layout::DATA_LEN;

#[derive(Clone)]
pub struct DataRegion {
    blocks: [[u8; BLOCK_SIZE]; TABLE_SIZE],
}

impl DataRegion {
    pub fn new() -> Self {
        Self {
            blocks: [[0; BLOCK_SIZE]; TABLE_SIZE],
        }
    }

    /// Raw copy in from the on-disk region.
    pub fn decode(buf: &[u8; DATA_LEN]) -> Self {
        let mut region = Self::new();
        for (i, block) in region.blocks.iter_mut().enumerate() {
            block.copy_from_slice(&buf[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE]);
        }
        region
    }

    /// Raw copy out for the on-disk region.
    pub fn encode(&self) -> [u8; DATA_LEN] {
        let mut buf = [0u8; DATA_LEN];
        for (i, block) in self.blocks.iter().enumerate() {
            buf[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE].copy_from_slice(block);
        }
        buf
    }

    pub fn block(&self, index: usize) -> Result<&[u8; BLOCK_SIZE]> {
        self.blocks.get(index).ok_or(FsError::OutOfBounds)
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Result<&mut [u8; BLOCK_SIZE]> {
        self.blocks.get_mut(index).ok_or(FsError::OutOfBounds)
    }

    /// The block's fill: the position of its first zero byte, or the full
    /// block size when no terminator remains.
    pub fn used_len(&self, index: usize) -> Result<usize> {
        let block = self.block(index)?;
        Ok(block.iter().position(|&b| b == 0).unwrap_or(BLOCK_SIZE))
    }

    /// Zeroes a block's content.
    pub fn clear_block(&mut self, index: usize) -> Result<()> {
        self.block_mut(index)?.fill(0);
        Ok(())
    }
}

impl Default for DataRegion {
    fn default() -> Self {
        Self::new()
    }
}
