//! Open-file handles: a fixed table of descriptors, each pairing a
//! directory slot with an access mode and a byte cursor.

use crate::config::MAX_OPEN_FILES;
use crate::error::{FsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// An open file. Descriptors reference their directory entry by slot
/// index, never by pointer; the engine keeps a referenced slot alive by
/// refusing to delete or overwrite open files.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub slot: usize,
    pub mode: OpenMode,
    pub cursor: usize,
}

impl Descriptor {
    pub fn new(slot: usize, mode: OpenMode) -> Self {
        Self {
            slot,
            mode,
            cursor: 0,
        }
    }
}

#[derive(Debug)]
pub struct DescriptorTable {
    slots: [Option<Descriptor>; MAX_OPEN_FILES],
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_OPEN_FILES],
        }
    }

    /// Registers a descriptor in the first unused slot and returns that
    /// index as the public handle. A directory slot with a write
    /// descriptor already open rejects a second writer.
    pub fn register(&mut self, desc: Descriptor) -> Result<usize> {
        let mut insert_at = None;
        for (i, current) in self.slots.iter().enumerate() {
            match current {
                None => {
                    if insert_at.is_none() {
                        insert_at = Some(i);
                    }
                }
                Some(open) => {
                    if open.slot == desc.slot
                        && open.mode == OpenMode::Write
                        && desc.mode == OpenMode::Write
                    {
                        return Err(FsError::WriterConflict);
                    }
                }
            }
        }
        let handle = insert_at.ok_or(FsError::DescriptorsExhausted)?;
        self.slots[handle] = Some(desc);
        Ok(handle)
    }

    pub fn get(&self, handle: usize) -> Result<&Descriptor> {
        self.slots
            .get(handle)
            .and_then(|d| d.as_ref())
            .ok_or(FsError::NotOpen)
    }

    pub fn get_mut(&mut self, handle: usize) -> Result<&mut Descriptor> {
        self.slots
            .get_mut(handle)
            .and_then(|d| d.as_mut())
            .ok_or(FsError::NotOpen)
    }

    /// Frees the handle's slot, returning the descriptor it held.
    pub fn release(&mut self, handle: usize) -> Result<Descriptor> {
        self.slots
            .get_mut(handle)
            .and_then(|d| d.take())
            .ok_or(FsError::NotOpen)
    }

    /// Whether any descriptor references the given directory slot.
    pub fn slot_is_open(&self, slot: usize) -> bool {
        self.slots.iter().flatten().any(|d| d.slot == slot)
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}
