use crate::config::{BLOCK_SIZE, MAGIC, MAX_ENTRIES};
use crate::error::{FsError, Result};
use crate::layout::VOLUME_SIZE;

/// The volume descriptor identifies the image and pins the configuration it
/// was formatted with. Mount refuses any image whose descriptor disagrees
/// with the compiled constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeDescriptor {
    pub magic: u32,
    pub block_size: u32,
    pub max_entries: u32,
}

impl VolumeDescriptor {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            block_size: BLOCK_SIZE as u32,
            max_entries: MAX_ENTRIES as u32,
        }
    }

    pub fn decode(buf: &[u8; VOLUME_SIZE]) -> Self {
        Self {
            magic: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            block_size: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            max_entries: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        }
    }

    pub fn encode(&self) -> [u8; VOLUME_SIZE] {
        let mut buf = [0u8; VOLUME_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.block_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.max_entries.to_le_bytes());
        buf
    }

    /// Mount-time compatibility check against the compiled configuration.
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(FsError::VolumeMismatch {
                field: "magic",
                found: self.magic,
                expected: MAGIC,
            });
        }
        if self.block_size != BLOCK_SIZE as u32 {
            return Err(FsError::VolumeMismatch {
                field: "block size",
                found: self.block_size,
                expected: BLOCK_SIZE as u32,
            });
        }
        if self.max_entries != MAX_ENTRIES as u32 {
            return Err(FsError::VolumeMismatch {
                field: "max entries",
                found: self.max_entries,
                expected: MAX_ENTRIES as u32,
            });
        }
        Ok(())
    }
}

impl Default for VolumeDescriptor {
    fn default() -> Self {
        Self::new()
    }
}
