//! Byte positions of the four on-disk regions. Pure offsets, no logic.

use crate::config::*;

pub const VOLUME_OFFSET: u64 = 0;
pub const VOLUME_SIZE: usize = 12; // Three little-endian u32 values

pub const TABLE_OFFSET: u64 = VOLUME_OFFSET + VOLUME_SIZE as u64;
pub const TABLE_LEN: usize = TABLE_SIZE; // One byte per cell

pub const DIRECTORY_OFFSET: u64 = TABLE_OFFSET + TABLE_LEN as u64;
pub const DIRECTORY_LEN: usize = MAX_ENTRIES * ENTRY_SIZE;

pub const DATA_OFFSET: u64 = DIRECTORY_OFFSET + DIRECTORY_LEN as u64;
pub const DATA_LEN: usize = TABLE_SIZE * BLOCK_SIZE;

pub const IMAGE_SIZE: u64 = DATA_OFFSET + DATA_LEN as u64;
