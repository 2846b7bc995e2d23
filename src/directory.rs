//! The root (only) directory: a fixed array of file records, with the
//! empty name standing in for a free slot.

use crate::config::{ENTRY_SIZE, FILE_NAME_SIZE, MAX_ENTRIES};
use crate::error::{FsError, Result};
use crate::layout::DIRECTORY_LEN;

pub fn trim_zero(name: &[u8]) -> &[u8] {
    let mut end = name.len();
    while end > 0 && name[end - 1] == 0 {
        end -= 1;
    }
    &name[..end]
}

/// One file record: name, first allocation-table index, recorded size.
#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; FILE_NAME_SIZE],
    pub first_block: i16,
    pub size: i16,
}

impl DirEntry {
    /// The free-slot sentinel.
    pub const EMPTY: Self = Self {
        name: [0; FILE_NAME_SIZE],
        first_block: -1,
        size: 0,
    };

    pub fn new(name: &str, first_block: i16) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > FILE_NAME_SIZE {
            return Err(FsError::InvalidName);
        }
        let mut arr = [0u8; FILE_NAME_SIZE];
        arr[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            name: arr,
            first_block,
            size: 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.iter().all(|&c| c == 0)
    }

    pub fn name_eq(&self, name: &str) -> bool {
        trim_zero(&self.name) == name.as_bytes()
    }

    fn decode(buf: &[u8]) -> Self {
        let mut name = [0u8; FILE_NAME_SIZE];
        name.copy_from_slice(&buf[..FILE_NAME_SIZE]);
        Self {
            name,
            first_block: i16::from_le_bytes([buf[32], buf[33]]),
            size: i16::from_le_bytes([buf[34], buf[35]]),
        }
    }

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..FILE_NAME_SIZE].copy_from_slice(&self.name);
        buf[32..34].copy_from_slice(&self.first_block.to_le_bytes());
        buf[34..36].copy_from_slice(&self.size.to_le_bytes());
    }
}

#[derive(Debug, Clone)]
pub struct Directory {
    entries: [DirEntry; MAX_ENTRIES],
    next_free: Option<usize>,
    storing: usize,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            entries: [DirEntry::EMPTY; MAX_ENTRIES],
            next_free: Some(0),
            storing: 0,
        }
    }

    /// Rebuilds the directory from its on-disk bytes, recomputing the free
    /// cursor and occupancy from the empty-name sentinels.
    pub fn decode(buf: &[u8; DIRECTORY_LEN]) -> Self {
        let mut dir = Self {
            entries: [DirEntry::EMPTY; MAX_ENTRIES],
            next_free: None,
            storing: 0,
        };
        for i in 0..MAX_ENTRIES {
            let entry = DirEntry::decode(&buf[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
            if entry.is_empty() {
                if dir.next_free.is_none() {
                    dir.next_free = Some(i);
                }
            } else {
                dir.storing += 1;
            }
            dir.entries[i] = entry;
        }
        dir
    }

    pub fn encode(&self) -> [u8; DIRECTORY_LEN] {
        let mut buf = [0u8; DIRECTORY_LEN];
        for (i, entry) in self.entries.iter().enumerate() {
            entry.encode_into(&mut buf[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
        }
        buf
    }

    pub fn entry(&self, slot: usize) -> &DirEntry {
        &self.entries[slot]
    }

    pub(crate) fn entry_mut(&mut self, slot: usize) -> &mut DirEntry {
        &mut self.entries[slot]
    }

    /// Linear scan for an exact name match.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        (0..MAX_ENTRIES).find(|&i| !self.entries[i].is_empty() && self.entries[i].name_eq(name))
    }

    /// Linear scan from `from` upward for the first free slot.
    pub fn find_free_from(&self, from: usize) -> Option<usize> {
        (from..MAX_ENTRIES).find(|&i| self.entries[i].is_empty())
    }

    /// Places `entry` at the free cursor and advances it.
    pub fn insert(&mut self, entry: DirEntry) -> Result<usize> {
        let slot = self.next_free.ok_or(FsError::DirectoryFull)?;
        self.entries[slot] = entry;
        self.storing += 1;
        self.next_free = self.find_free_from(slot + 1);
        Ok(slot)
    }

    /// Swaps the record at an occupied slot; bookkeeping is unchanged.
    pub(crate) fn replace(&mut self, slot: usize, entry: DirEntry) {
        self.entries[slot] = entry;
    }

    /// Returns the slot to the free pool, lowering the cursor if the slot
    /// sits below it.
    pub(crate) fn clear(&mut self, slot: usize) {
        self.entries[slot] = DirEntry::EMPTY;
        self.storing -= 1;
        if self.next_free.is_none_or(|f| slot < f) {
            self.next_free = Some(slot);
        }
    }

    /// Lowest free slot, or none when the directory is full.
    pub fn next_free(&self) -> Option<usize> {
        self.next_free
    }

    /// Count of occupied slots.
    pub fn storing(&self) -> usize {
        self.storing
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
