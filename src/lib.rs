//! Ferrite is a minimal FAT-style filesystem emulated inside a single host file.
//!
//! Ferrite's linear layout:
//! - Volume descriptor (magic, block size, entry capacity)
//! - Allocation table (one byte per cell; file chains are threaded through it)
//! - Root directory (flat, fixed capacity: name, first block, size per record)
//! - Data region (fixed-size blocks, index-aligned 1:1 with the table)
//!
//! Mount loads all four regions into memory and every operation mutates the
//! in-memory structures only. Sync rewrites the four regions in full, in the
//! order above, then flushes the device. Unmount syncs, closes outstanding
//! descriptors, and drops the store handle.
//!
//! Block content carries null-terminated string semantics: a
//! block's fill is the position of its first zero byte. A payload byte of
//! value zero is therefore indistinguishable from unused space, and content
//! containing one is truncated on read-back. This is a documented boundary
//! of the format, not something the crate works around.

mod config;
mod layout;
mod error;
mod volume;
mod table;
mod directory;
mod data;
mod descriptor;
mod fs;

pub use config::*;
pub use layout::*;
pub use error::FsError as Error;
pub use error::{FsError, Result};
pub use volume::VolumeDescriptor;
pub use table::{AllocationTable, Cell};
pub use directory::{DirEntry, Directory};
pub use data::DataRegion;
pub use descriptor::{Descriptor, DescriptorTable, OpenMode};
pub use fs::FileSystem;
