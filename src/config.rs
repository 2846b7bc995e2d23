pub const MAGIC: u32 = 0x46525431; // "FRT1" in ASCII

pub const BLOCK_SIZE: usize = 25; // Bytes per data block
pub const MAX_ENTRIES: usize = 3; // Capacity of the root (only) directory
pub const TABLE_SIZE: usize = 10; // Allocation table cells, one per data block

pub const FILE_NAME_SIZE: usize = 32; // Name bytes per directory entry
pub const ENTRY_SIZE: usize = FILE_NAME_SIZE + 2 + 2; // Name + first block + size
pub const MAX_OPEN_FILES: usize = MAX_ENTRIES; // Descriptor table capacity
