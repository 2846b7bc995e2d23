#![allow(unused)]

mod common;

use std::path::PathBuf;

use ferrite::*;
use tempfile::TempDir;

/// Formats a fresh image inside `dir` and mounts it.
fn fresh_fs(dir: &TempDir) -> FileSystem {
    let path = dir.path().join("volume.img");
    FileSystem::format(&path).unwrap();
    FileSystem::mount(&path).unwrap()
}

#[test]
fn create_opens_for_writing() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("notes").unwrap();
    let written = fs.write(fd, b"hello").unwrap();
    assert_eq!(written, 5);
    assert_eq!(fs.filesize("notes").unwrap(), 5);

    assert_eq!(fs.table().storing(), 1);
    assert_eq!(fs.table().next_free(), Some(1));
    assert_eq!(fs.directory().storing(), 1);
    assert_eq!(fs.directory().next_free(), Some(1));
    log!("{}", fs.dump());
}

#[test]
fn write_spans_blocks() {
    // The 30-byte write lands as 25 + 5 across two chained blocks.
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    let payload: Vec<u8> = (1..=30u8).collect();
    assert_eq!(fs.write(fd, &payload).unwrap(), 30);
    assert_eq!(fs.filesize("a").unwrap(), 30);

    assert_eq!(fs.table().storing(), 2);
    assert_eq!(fs.table().cell(0).unwrap(), Cell::Next(1));
    assert_eq!(fs.table().cell(1).unwrap(), Cell::End);
    assert_eq!(fs.data().used_len(0).unwrap(), BLOCK_SIZE);
    assert_eq!(fs.data().used_len(1).unwrap(), 5);
    fs.close(fd).unwrap();

    let fd = fs.open("a", OpenMode::Read).unwrap();
    let mut buf = vec![0u8; 30];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 30);
    assert_eq!(buf, payload);
    // Cursor sits at end of content now.
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);
}

#[test]
fn seek_walks_the_chain() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    fs.write(fd, &[7u8; 30]).unwrap();

    // Block boundary: lands exactly at the start of block 2.
    assert_eq!(fs.seek(fd, 25).unwrap(), 25);
    assert_eq!(fs.seek(fd, 30).unwrap(), 30);
    // Two blocks hold at most 50 reachable bytes.
    assert_eq!(fs.seek(fd, 50).unwrap(), 50);
    assert!(matches!(fs.seek(fd, 51), Err(FsError::OffsetOutOfRange(51))));
    assert!(matches!(fs.seek(fd, -1), Err(FsError::BadOffset(-1))));
    assert_eq!(fs.seek(fd, 0).unwrap(), 0);
}

#[test]
fn read_starts_at_the_cursor() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    let payload: Vec<u8> = (1..=30u8).collect();
    fs.write(fd, &payload).unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("a", OpenMode::Read).unwrap();
    fs.seek(fd, 25).unwrap();
    let mut buf = vec![0u8; 30];
    let read = fs.read(fd, &mut buf).unwrap();
    assert_eq!(read, 5);
    assert_eq!(&buf[..5], &payload[25..]);
}

#[test]
fn exact_block_boundary_chains_on_the_next_byte() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    // Exactly one block: full, no terminator byte left free.
    assert_eq!(fs.write(fd, &[9u8; BLOCK_SIZE]).unwrap(), BLOCK_SIZE);
    assert_eq!(fs.table().storing(), 1);
    assert_eq!(fs.data().used_len(0).unwrap(), BLOCK_SIZE);

    // One more byte must chain to a second block.
    assert_eq!(fs.write(fd, &[9u8]).unwrap(), 1);
    assert_eq!(fs.table().storing(), 2);
    assert_eq!(fs.table().cell(0).unwrap(), Cell::Next(1));
    assert_eq!(fs.filesize("a").unwrap(), BLOCK_SIZE + 1);
}

#[test]
fn exhausted_table_yields_a_partial_write() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("big").unwrap();
    let capacity = TABLE_SIZE * BLOCK_SIZE;
    let payload = vec![3u8; capacity + 30];
    // Non-fatal: the write stops at the last byte that fit.
    assert_eq!(fs.write(fd, &payload).unwrap(), capacity);
    assert_eq!(fs.table().storing(), TABLE_SIZE);
    assert_eq!(fs.table().next_free(), None);
    assert_eq!(fs.filesize("big").unwrap(), capacity);

    // A second file cannot claim a first block any more.
    assert!(matches!(fs.create("other"), Err(FsError::TableFull)));
}

#[test]
fn delete_frees_the_lowest_index_first() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd_a = fs.create("a").unwrap();
    fs.write(fd_a, &[1u8; 30]).unwrap(); // blocks 0 and 1
    fs.close(fd_a).unwrap();
    let fd_b = fs.create("b").unwrap(); // block 2
    fs.close(fd_b).unwrap();

    fs.delete("a").unwrap();
    assert_eq!(fs.table().storing(), 1);
    assert_eq!(fs.table().next_free(), Some(0));
    assert_eq!(fs.directory().next_free(), Some(0));
    assert!(matches!(fs.filesize("a"), Err(FsError::NotFound)));

    // The freed low index is reused by the next create.
    let fd_c = fs.create("c").unwrap();
    let slot = fs.directory().lookup("c").unwrap();
    assert_eq!(slot, 0);
    assert_eq!(fs.directory().entry(slot).first_block, 0);
}

#[test]
fn counters_always_match_occupancy() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let check = |fs: &FileSystem| {
        let free_cells = (0..TABLE_SIZE)
            .filter(|&i| fs.table().cell(i).unwrap() == Cell::Free)
            .count();
        assert_eq!(fs.table().storing(), TABLE_SIZE - free_cells);
        if let Some(f) = fs.table().next_free() {
            assert_eq!(fs.table().cell(f).unwrap(), Cell::Free);
        }
        let occupied = (0..MAX_ENTRIES)
            .filter(|&i| !fs.directory().entry(i).is_empty())
            .count();
        assert_eq!(fs.directory().storing(), occupied);
        if let Some(f) = fs.directory().next_free() {
            assert!(fs.directory().entry(f).is_empty());
        }
    };

    check(&fs);
    let fd = fs.create("a").unwrap();
    check(&fs);
    fs.write(fd, &[5u8; 60]).unwrap();
    check(&fs);
    fs.close(fd).unwrap();
    let fd = fs.create("b").unwrap();
    fs.close(fd).unwrap();
    check(&fs);
    fs.delete("a").unwrap();
    check(&fs);
    fs.delete("b").unwrap();
    check(&fs);
}

#[test]
fn single_writer_per_file() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    fs.close(fd).unwrap();

    let writer = fs.open("a", OpenMode::Write).unwrap();
    assert!(matches!(
        fs.open("a", OpenMode::Write),
        Err(FsError::WriterConflict)
    ));
    // Readers of the same name are unaffected.
    let reader = fs.open("a", OpenMode::Read).unwrap();
    fs.close(reader).unwrap();
    fs.close(writer).unwrap();
}

#[test]
fn open_files_resist_delete_and_overwrite() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    fs.write(fd, b"kept").unwrap();

    assert!(matches!(fs.delete("a"), Err(FsError::FileBusy)));
    // Re-creating an existing name is an overwrite and is refused too.
    assert!(matches!(fs.create("a"), Err(FsError::FileBusy)));

    fs.close(fd).unwrap();
    fs.delete("a").unwrap();
    assert!(matches!(fs.delete("a"), Err(FsError::NotFound)));
}

#[test]
fn overwrite_keeps_the_first_block() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    fs.write(fd, &[8u8; 60]).unwrap(); // blocks 0..=2
    fs.close(fd).unwrap();
    assert_eq!(fs.table().storing(), 3);

    // create on an existing name releases the old chain.
    let fd = fs.create("a").unwrap();
    assert_eq!(fs.table().storing(), 1);
    assert_eq!(fs.table().cell(0).unwrap(), Cell::End);
    assert_eq!(fs.directory().entry(0).first_block, 0);
    assert_eq!(fs.filesize("a").unwrap(), 0);

    // The fresh chain is writable from scratch.
    assert_eq!(fs.write(fd, b"anew").unwrap(), 4);
    assert_eq!(fs.filesize("a").unwrap(), 4);
    fs.close(fd).unwrap();
}

#[test]
fn directory_capacity_is_bounded() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    for name in ["a", "b", "c"] {
        let fd = fs.create(name).unwrap();
        fs.close(fd).unwrap();
    }
    assert_eq!(fs.directory().storing(), MAX_ENTRIES);
    assert!(matches!(fs.create("d"), Err(FsError::DirectoryFull)));
}

#[test]
fn descriptor_table_capacity_is_bounded() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    fs.close(fd).unwrap();

    let handles: Vec<usize> = (0..MAX_OPEN_FILES)
        .map(|_| fs.open("a", OpenMode::Read).unwrap())
        .collect();
    assert!(matches!(
        fs.open("a", OpenMode::Read),
        Err(FsError::DescriptorsExhausted)
    ));
    for fd in handles {
        fs.close(fd).unwrap();
    }
}

#[test]
fn modes_gate_read_and_write() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let writer = fs.create("a").unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(fs.read(writer, &mut buf), Err(FsError::NotReadable)));
    fs.close(writer).unwrap();

    let reader = fs.open("a", OpenMode::Read).unwrap();
    assert!(matches!(fs.write(reader, b"no"), Err(FsError::NotWritable)));
    fs.close(reader).unwrap();

    assert!(matches!(fs.write(reader, b"no"), Err(FsError::NotOpen)));
    assert!(matches!(fs.seek(reader, 0), Err(FsError::NotOpen)));
}

#[test]
fn embedded_zero_truncates_content() {
    // The documented boundary of the null-terminated block model: a
    // payload zero reads back as end-of-content.
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);

    let fd = fs.create("a").unwrap();
    assert_eq!(fs.write(fd, b"ab\0cd").unwrap(), 5);
    assert_eq!(fs.filesize("a").unwrap(), 5);
    fs.close(fd).unwrap();

    let fd = fs.open("a", OpenMode::Read).unwrap();
    let mut buf = vec![0u8; 8];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"ab");
    fs.close(fd).unwrap();
}

#[test]
fn empty_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut fs = fresh_fs(&dir);
    assert!(matches!(fs.create(""), Err(FsError::InvalidName)));
    let long = "n".repeat(FILE_NAME_SIZE + 1);
    assert!(matches!(fs.create(&long), Err(FsError::InvalidName)));
    assert!(matches!(fs.open("ghost", OpenMode::Read), Err(FsError::NotFound)));
}
