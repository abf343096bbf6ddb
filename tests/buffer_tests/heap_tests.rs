//! Tests for HeapBuffer
//!
//! These tests verify:
//! - Allocate-fresh growth (new span zeroed, previous span intact)
//! - Growth never shrinks
//! - Per-region limits
//! - Close semantics

use cachebuf::{Buffer, BufferCreator, BufferError, HeapBuffer, HeapBufferCreator};

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_new_buffer_is_zeroed() {
    let buffer = HeapBuffer::new(64);

    assert_eq!(buffer.len(), 64);
    assert!(buffer.bytes().iter().all(|&b| b == 0));
}

#[test]
fn test_creator_returns_requested_size() {
    let creator = HeapBufferCreator::new();

    let buffer = creator.create(4096).unwrap();

    assert_eq!(buffer.len(), 4096);
}

#[test]
fn test_creator_rejects_zero_size() {
    let creator = HeapBufferCreator::new();

    let result = creator.create(0);

    assert!(matches!(result, Err(BufferError::InvalidSize { size: 0, .. })));
}

#[test]
fn test_creator_rejects_initial_size_over_limit() {
    let creator = HeapBufferCreator::new().with_limit(Some(1024));

    let result = creator.create(2048);

    assert!(matches!(
        result,
        Err(BufferError::CapacityExhausted { requested: 2048, limit: 1024 })
    ));
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_enlarge_is_allocate_fresh() {
    let mut buffer = HeapBuffer::new(16);
    buffer.bytes_mut()[0] = 0xFF;

    let grown = buffer.enlarge(32).unwrap();

    assert_eq!(grown.next().len(), 32);
    assert_eq!(grown.next()[0], 0x00);
    assert_eq!(grown.previous().len(), 16);
    assert_eq!(grown.previous()[0], 0xFF);
    assert!(!grown.is_preserved());
}

#[test]
fn test_enlarge_adopts_new_span() {
    let mut buffer = HeapBuffer::new(16);

    {
        let mut grown = buffer.enlarge(32).unwrap();
        grown.next_mut()[31] = 7;
    }

    assert_eq!(buffer.len(), 32);
    assert_eq!(buffer.bytes()[31], 7);
}

#[test]
fn test_enlarge_below_current_size_does_not_shrink() {
    let mut buffer = HeapBuffer::new(64);

    let grown = buffer.enlarge(16).unwrap();
    assert_eq!(grown.next().len(), 64);

    assert_eq!(buffer.len(), 64);
}

#[test]
fn test_enlarge_past_limit_leaves_buffer_untouched() {
    let mut buffer = HeapBuffer::new(16).with_limit(Some(32));
    buffer.bytes_mut()[3] = 0xAB;

    let result = buffer.enlarge(64);

    assert!(matches!(
        result,
        Err(BufferError::CapacityExhausted { requested: 64, limit: 32 })
    ));
    assert_eq!(buffer.len(), 16);
    assert_eq!(buffer.bytes()[3], 0xAB);
}

#[test]
fn test_enlarge_up_to_limit_succeeds() {
    let mut buffer = HeapBuffer::new(16).with_limit(Some(32));

    let grown = buffer.enlarge(32).unwrap();

    assert_eq!(grown.next().len(), 32);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_empties_buffer() {
    let mut buffer = HeapBuffer::new(128);

    buffer.close().unwrap();

    assert!(buffer.is_empty());
}

#[test]
fn test_close_twice_is_noop() {
    let mut buffer = HeapBuffer::new(128);

    buffer.close().unwrap();
    buffer.close().unwrap();

    assert!(buffer.is_empty());
}
