//! The filesystem engine: the load/sync protocol between the in-memory
//! regions and the backing file, and the operations consumed by callers.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, error, warn};

use crate::config::{BLOCK_SIZE, MAX_ENTRIES, MAX_OPEN_FILES, TABLE_SIZE};
use crate::data::DataRegion;
use crate::descriptor::{Descriptor, DescriptorTable, OpenMode};
use crate::directory::{DirEntry, Directory, trim_zero};
use crate::error::{FsError, Result};
use crate::layout::{
    DATA_LEN, DATA_OFFSET, DIRECTORY_LEN, DIRECTORY_OFFSET, TABLE_OFFSET, VOLUME_OFFSET,
    VOLUME_SIZE,
};
use crate::table::{AllocationTable, Cell};
use crate::volume::VolumeDescriptor;

/// One mounted volume. Everything lives here, no global state; callers
/// keep the instance for the whole session and `unmount` ends it.
pub struct FileSystem {
    store: Option<File>,
    volume: VolumeDescriptor,
    table: AllocationTable,
    directory: Directory,
    data: DataRegion,
    descriptors: DescriptorTable,
}

/// Serializes the four regions at their fixed offsets, in their fixed
/// order. Shared by format and sync; the full-region rewrite is idempotent,
/// so no partial-write recovery is attempted.
fn write_regions(
    store: &mut File,
    volume: &VolumeDescriptor,
    table: &AllocationTable,
    directory: &Directory,
    data: &DataRegion,
) -> Result<()> {
    store.seek(SeekFrom::Start(VOLUME_OFFSET))?;
    store.write_all(&volume.encode())?;
    store.seek(SeekFrom::Start(TABLE_OFFSET))?;
    store.write_all(&table.encode())?;
    store.seek(SeekFrom::Start(DIRECTORY_OFFSET))?;
    store.write_all(&directory.encode())?;
    store.seek(SeekFrom::Start(DATA_OFFSET))?;
    store.write_all(&data.encode())?;
    Ok(())
}

impl FileSystem {
    /// Creates the backing store at `path` and writes a fresh image into
    /// it: a descriptor carrying the compiled configuration, a fully free
    /// table, an empty directory, and a zeroed data region.
    pub fn format(path: &Path) -> Result<()> {
        let mut store = File::create(path).inspect_err(|e| {
            error!("format: cannot create store {}: {e}", path.display());
        })?;
        write_regions(
            &mut store,
            &VolumeDescriptor::new(),
            &AllocationTable::new(),
            &Directory::new(),
            &DataRegion::new(),
        )?;
        store.sync_all()?;
        debug!("formatted {}", path.display());
        Ok(())
    }

    /// Opens the store at `path`, validates its volume descriptor against
    /// the compiled configuration, and loads all four regions into memory.
    /// A mismatched descriptor aborts the mount before anything exists.
    pub fn mount(path: &Path) -> Result<Self> {
        let mut store = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .inspect_err(|e| {
                error!("mount: cannot open store {}: {e}", path.display());
            })?;

        let mut volume_buf = [0u8; VOLUME_SIZE];
        store.seek(SeekFrom::Start(VOLUME_OFFSET))?;
        store.read_exact(&mut volume_buf)?;
        let volume = VolumeDescriptor::decode(&volume_buf);
        volume.validate().inspect_err(|e| {
            error!("mount: {}: {e}", path.display());
        })?;

        let mut table_buf = [0u8; TABLE_SIZE];
        store.seek(SeekFrom::Start(TABLE_OFFSET))?;
        store.read_exact(&mut table_buf)?;

        let mut directory_buf = [0u8; DIRECTORY_LEN];
        store.seek(SeekFrom::Start(DIRECTORY_OFFSET))?;
        store.read_exact(&mut directory_buf)?;

        let mut data_buf = [0u8; DATA_LEN];
        store.seek(SeekFrom::Start(DATA_OFFSET))?;
        store.read_exact(&mut data_buf)?;

        debug!("mounted {}", path.display());
        Ok(Self {
            store: Some(store),
            volume,
            table: AllocationTable::decode(&table_buf),
            directory: Directory::decode(&directory_buf),
            data: DataRegion::decode(&data_buf),
            descriptors: DescriptorTable::new(),
        })
    }

    pub fn mounted(&self) -> bool {
        self.store.is_some()
    }

    /// Rewrites all four regions to the store in their fixed order, then
    /// flushes the device.
    pub fn sync(&mut self) -> Result<()> {
        let store = self.store.as_mut().ok_or(FsError::NotMounted)?;
        write_regions(store, &self.volume, &self.table, &self.directory, &self.data)
            .inspect_err(|e| error!("sync: {e}"))?;
        store.sync_all()?;
        Ok(())
    }

    /// Syncs, closes every still-open descriptor (each close syncs again),
    /// closes the store, and resets the in-memory structures. A failed
    /// sync fails the whole operation and leaves the mount untouched.
    pub fn unmount(&mut self) -> Result<()> {
        self.sync()?;
        for handle in 0..MAX_OPEN_FILES {
            if self.descriptors.get(handle).is_ok() {
                self.close(handle)?;
            }
        }
        self.store = None;
        self.volume = VolumeDescriptor::new();
        self.table = AllocationTable::new();
        self.directory = Directory::new();
        self.data = DataRegion::new();
        self.descriptors = DescriptorTable::new();
        debug!("unmounted");
        Ok(())
    }

    /// Creates `name` and opens it for writing, returning the handle. An
    /// existing name is overwritten in place (provided it is not open).
    /// Creation checks both free cursors before claiming anything, so a
    /// full table or directory leaves existing state untouched. When the
    /// descriptor table is full the file still exists; the caller must
    /// `open` it once a handle frees up.
    pub fn create(&mut self, name: &str) -> Result<usize> {
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        if name.is_empty() {
            return Err(FsError::InvalidName);
        }

        if self.directory.lookup(name).is_some() {
            return self.overwrite(name);
        }

        if self.directory.next_free().is_none() {
            return Err(FsError::DirectoryFull);
        }
        let mut entry = DirEntry::new(name, -1)?;
        let first = self.table.allocate_start()?;
        entry.first_block = first as i16;
        let slot = self.directory.insert(entry)?;
        self.descriptors.register(Descriptor::new(slot, OpenMode::Write))
    }

    /// Releases an existing file's chain and replaces it with an empty
    /// file of the same name, kept on its original first block. Reached
    /// through `create` when the name already exists.
    fn overwrite(&mut self, name: &str) -> Result<usize> {
        let slot = self.directory.lookup(name).ok_or(FsError::NotFound)?;
        if self.descriptors.slot_is_open(slot) {
            return Err(FsError::FileBusy);
        }

        let first = self.directory.entry(slot).first_block as usize;
        let data = &mut self.data;
        self.table.clear_chain(first, &mut |i| data.clear_block(i))?;
        self.table.reclaim(first)?;
        let entry = DirEntry::new(name, first as i16)?;
        self.directory.replace(slot, entry);
        self.descriptors.register(Descriptor::new(slot, OpenMode::Write))
    }

    /// Removes `name`, freeing its chain and directory slot, then syncs.
    /// Open files cannot be deleted.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        let slot = self.directory.lookup(name).ok_or(FsError::NotFound)?;
        if self.descriptors.slot_is_open(slot) {
            return Err(FsError::FileBusy);
        }

        let first = self.directory.entry(slot).first_block as usize;
        let data = &mut self.data;
        self.table.clear_chain(first, &mut |i| data.clear_block(i))?;
        self.directory.clear(slot);
        self.sync()
    }

    /// Opens `name` with the given mode, cursor at 0, and returns the
    /// handle. At most one write handle may exist per file.
    pub fn open(&mut self, name: &str, mode: OpenMode) -> Result<usize> {
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        let slot = self.directory.lookup(name).ok_or(FsError::NotFound)?;
        self.descriptors.register(Descriptor::new(slot, mode))
    }

    /// Releases the handle and triggers a full sync.
    pub fn close(&mut self, handle: usize) -> Result<()> {
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        self.descriptors.release(handle)?;
        self.sync()
    }

    /// Appends `bytes` to the end of the file's content, chaining new
    /// blocks as existing ones fill. Returns the count written, which
    /// falls short of the request when the table runs out of cells
    /// (partial write, non-fatal).
    pub fn write(&mut self, handle: usize, bytes: &[u8]) -> Result<usize> {
        let desc = *self.descriptors.get(handle)?;
        if desc.mode != OpenMode::Write {
            return Err(FsError::NotWritable);
        }

        let slot = desc.slot;
        let mut index = self.directory.entry(slot).first_block as usize;
        let mut fill = self.data.used_len(index)?;
        let mut written = 0;

        'copy: for &byte in bytes {
            while fill == BLOCK_SIZE {
                index = match self.table.cell(index)? {
                    Cell::Next(n) => n as usize,
                    Cell::End => match self.table.allocate_next(index) {
                        Ok(n) => n,
                        Err(FsError::TableFull) => {
                            warn!("write stopped at {written} bytes: no file space remaining");
                            break 'copy;
                        }
                        Err(e) => return Err(e),
                    },
                    Cell::Free => return Err(FsError::OutOfBounds),
                };
                fill = self.data.used_len(index)?;
            }
            let block = self.data.block_mut(index)?;
            let prior = block[fill];
            block[fill] = byte;
            fill += 1;
            written += 1;
            // A slot that held a terminating zero was unwritten space: the
            // file just grew by one byte.
            if prior == 0 {
                self.directory.entry_mut(slot).size += 1;
            }
        }

        self.descriptors.get_mut(handle)?.cursor += written;
        Ok(written)
    }

    /// Reads from the descriptor's cursor into `buf`, stopping when the
    /// buffer is full or content ends (a block filled below capacity ends
    /// the content at its first zero byte). Returns the count read, zero
    /// at or past the end.
    pub fn read(&mut self, handle: usize, buf: &mut [u8]) -> Result<usize> {
        let desc = *self.descriptors.get(handle)?;
        if desc.mode != OpenMode::Read {
            return Err(FsError::NotReadable);
        }

        let mut index = self.directory.entry(desc.slot).first_block as usize;
        let mut offset = desc.cursor;
        // Skip whole blocks until the cursor's block.
        while offset >= BLOCK_SIZE {
            match self.table.cell(index)? {
                Cell::Next(n) => {
                    index = n as usize;
                    offset -= BLOCK_SIZE;
                }
                Cell::End => return Ok(0),
                Cell::Free => return Err(FsError::OutOfBounds),
            }
        }

        let mut read = 0;
        loop {
            let fill = self.data.used_len(index)?;
            if offset < fill && read < buf.len() {
                let take = (fill - offset).min(buf.len() - read);
                buf[read..read + take]
                    .copy_from_slice(&self.data.block(index)?[offset..offset + take]);
                read += take;
            }
            if read == buf.len() || fill < BLOCK_SIZE {
                break;
            }
            match self.table.cell(index)? {
                Cell::Next(n) => {
                    index = n as usize;
                    offset = 0;
                }
                Cell::End => break,
                Cell::Free => return Err(FsError::OutOfBounds),
            }
        }

        self.descriptors.get_mut(handle)?.cursor += read;
        Ok(read)
    }

    /// Moves the descriptor's cursor to `offset`, walking the chain to
    /// prove the offset reachable: every block on the way counts a full
    /// block's worth of bytes, the last only the remaining distance.
    /// Fails when the chain ends short of the offset.
    pub fn seek(&mut self, handle: usize, offset: i64) -> Result<u64> {
        if offset < 0 {
            return Err(FsError::BadOffset(offset));
        }
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        let desc = *self.descriptors.get(handle)?;

        let target = offset as usize;
        let mut index = self.directory.entry(desc.slot).first_block as usize;
        let mut reached = target.min(BLOCK_SIZE);
        while reached != target {
            match self.table.cell(index)? {
                Cell::Next(n) => index = n as usize,
                Cell::End => return Err(FsError::OffsetOutOfRange(offset)),
                Cell::Free => return Err(FsError::OutOfBounds),
            }
            reached += (target - reached).min(BLOCK_SIZE);
        }

        self.descriptors.get_mut(handle)?.cursor = target;
        Ok(target as u64)
    }

    /// Recorded size in bytes of the named file.
    pub fn filesize(&self, name: &str) -> Result<usize> {
        if !self.mounted() {
            return Err(FsError::NotMounted);
        }
        let slot = self.directory.lookup(name).ok_or(FsError::NotFound)?;
        Ok(self.directory.entry(slot).size as usize)
    }

    pub fn volume(&self) -> &VolumeDescriptor {
        &self.volume
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn data(&self) -> &DataRegion {
        &self.data
    }

    /// Human-readable snapshot of the four regions, for tests and
    /// debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "volume: magic={:#010x} block_size={} max_entries={}",
            self.volume.magic, self.volume.block_size, self.volume.max_entries
        );
        let _ = write!(out, "table ({} storing):", self.table.storing());
        for i in 0..TABLE_SIZE {
            match self.table.cell(i) {
                Ok(Cell::Free) => {
                    let _ = write!(out, " .");
                }
                Ok(Cell::End) => {
                    let _ = write!(out, " #");
                }
                Ok(Cell::Next(n)) => {
                    let _ = write!(out, " {n}");
                }
                Err(_) => {}
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "directory ({} storing):", self.directory.storing());
        for slot in 0..MAX_ENTRIES {
            let entry = self.directory.entry(slot);
            if entry.is_empty() {
                let _ = writeln!(out, "  [{slot}] <free>");
            } else {
                let _ = writeln!(
                    out,
                    "  [{slot}] {} first_block={} size={}",
                    String::from_utf8_lossy(trim_zero(&entry.name)),
                    entry.first_block,
                    entry.size
                );
            }
        }
        for i in 0..TABLE_SIZE {
            if let Ok(fill) = self.data.used_len(i) {
                if fill > 0 {
                    let _ = writeln!(out, "block {i}: {fill}/{BLOCK_SIZE} bytes");
                }
            }
        }
        out
    }
}
