//! Tests for MmapFileBuffer
//!
//! These tests verify:
//! - Content-preserving growth, including across relocation
//! - Failed growth leaves the region usable
//! - Close semantics

use std::path::PathBuf;

use cachebuf::mmap::MmapFile;
use cachebuf::{Buffer, BufferError, MmapFileBuffer};
use tempfile::TempDir;

const KB: usize = 1024;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_region() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("region");
    (temp_dir, path)
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_enlarge_preserves_content() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 64 * KB).unwrap();
    buffer.bytes_mut()[0] = 0x42;

    let grown = buffer.enlarge(128 * KB).unwrap();

    assert!(grown.next().len() >= 128 * KB);
    assert_eq!(grown.next()[0], 0x42);
    assert_eq!(grown.previous().len(), 64 * KB);
    assert_eq!(grown.previous()[0], 0x42);
    assert!(grown.is_preserved());

    assert_eq!(buffer.bytes()[0], 0x42);
}

#[test]
fn test_enlarge_extends_file_on_disk() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();

    buffer.enlarge(32 * KB).unwrap();

    assert!(std::fs::metadata(&path).unwrap().len() >= 32 * KB as u64);
}

#[test]
fn test_repeated_growth_keeps_every_marker() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();

    // Mark the last byte of each generation, then double 12 times (4 KB -> 16 MB)
    let mut markers = Vec::new();
    for round in 0..12u8 {
        let end = buffer.len() - 1;
        buffer.bytes_mut()[end] = round + 1;
        markers.push((end, round + 1));

        let target = buffer.len() * 2;
        let mut grown = buffer.enlarge(target).unwrap();
        grown.migrate(0..end + 1).unwrap();
    }

    assert_eq!(buffer.len(), 4 * KB << 12);
    for (offset, value) in markers {
        assert_eq!(buffer.bytes()[offset], value, "marker at {} lost", offset);
    }
}

#[test]
fn test_enlarge_below_current_size_does_not_shrink() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 16 * KB).unwrap();
    buffer.bytes_mut()[100] = 9;

    let grown = buffer.enlarge(4 * KB).unwrap();
    assert_eq!(grown.next().len(), 16 * KB);
    assert_eq!(grown.next()[100], 9);

    assert_eq!(buffer.len(), 16 * KB);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_unrepresentable_growth_leaves_region_usable() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 8 * KB).unwrap();
    buffer.bytes_mut()[..4].copy_from_slice(b"keep");

    let result = buffer.enlarge(usize::MAX);

    assert!(matches!(result, Err(BufferError::InvalidSize { .. })));
    assert_eq!(buffer.len(), 8 * KB);
    assert_eq!(&buffer.bytes()[..4], b"keep");

    // Still growable afterwards
    let grown = buffer.enlarge(16 * KB).unwrap();
    assert_eq!(&grown.next()[..4], b"keep");
}

#[test]
fn test_failed_allocation_leaves_region_usable() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 8 * KB).unwrap();
    buffer.bytes_mut()[..4].copy_from_slice(b"keep");

    let result = buffer.enlarge(i64::MAX as usize);

    assert!(matches!(result, Err(BufferError::Allocate { .. })));
    assert_eq!(buffer.len(), 8 * KB);
    assert_eq!(&buffer.bytes()[..4], b"keep");

    let grown = buffer.enlarge(16 * KB).unwrap();
    assert!(grown.is_preserved());
    assert_eq!(grown.next().len(), 16 * KB);
    assert_eq!(&grown.next()[..4], b"keep");
}

#[test]
fn test_migrate_past_preserved_span_is_rejected() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();

    let mut grown = buffer.enlarge(8 * KB).unwrap();

    assert!(matches!(
        grown.migrate(0..4 * KB + 1),
        Err(BufferError::InvalidSize { .. })
    ));
    assert_eq!(grown.migrate(0..4 * KB).unwrap().len(), 8 * KB);
}

#[test]
fn test_growth_past_limit_leaves_region_usable() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 8 * KB).unwrap().with_limit(Some(16 * KB));
    buffer.bytes_mut()[0] = 1;

    let result = buffer.enlarge(32 * KB);

    assert!(matches!(result, Err(BufferError::CapacityExhausted { .. })));
    assert_eq!(buffer.len(), 8 * KB);
    assert_eq!(buffer.bytes()[0], 1);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_then_enlarge_fails() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();

    buffer.close().unwrap();

    assert!(buffer.is_empty());
    assert!(matches!(buffer.enlarge(8 * KB), Err(BufferError::Released)));
}

#[test]
fn test_close_twice_is_noop() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();

    buffer.close().unwrap();
    buffer.close().unwrap();
}

#[test]
fn test_close_keeps_file_on_disk() {
    let (_temp, path) = setup_temp_region();
    let mut buffer = MmapFileBuffer::open(&path, 4 * KB).unwrap();
    buffer.bytes_mut()[..5].copy_from_slice(b"hello");

    buffer.close().unwrap();

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(&contents[..5], b"hello");
}

#[test]
fn test_from_mmap_file() {
    let (_temp, path) = setup_temp_region();
    let mmf = MmapFile::open(&path, 4 * KB).unwrap();

    let buffer = MmapFileBuffer::from(mmf);

    assert_eq!(buffer.len(), 4 * KB);
    assert!(buffer.mmap_file().file().is_some());
}
