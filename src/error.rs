use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("invalid file name")]
    InvalidName,
    #[error("filesystem is not mounted")]
    NotMounted,
    #[error("file not found")]
    NotFound,
    #[error("directory is full")]
    DirectoryFull,
    #[error("allocation table is full")]
    TableFull,
    #[error("descriptor table is full")]
    DescriptorsExhausted,
    #[error("file has open descriptors")]
    FileBusy,
    #[error("file is already open for writing")]
    WriterConflict,
    #[error("handle is not open")]
    NotOpen,
    #[error("handle was not opened for writing")]
    NotWritable,
    #[error("handle was not opened for reading")]
    NotReadable,
    #[error("negative offset {0}")]
    BadOffset(i64),
    #[error("offset {0} exceeds the file's chain")]
    OffsetOutOfRange(i64),
    #[error("index outside the allocation table")]
    OutOfBounds,
    #[error("volume descriptor mismatch: {field} is {found}, compiled configuration wants {expected}")]
    VolumeMismatch {
        field: &'static str,
        found: u32,
        expected: u32,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
