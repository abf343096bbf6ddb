//! Error types for cachebuf
//!
//! Provides a unified error type for all buffer operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using BufferError
pub type Result<T> = std::result::Result<T, BufferError>;

/// Unified error type for buffer and mapped-file operations
#[derive(Debug, Error)]
pub enum BufferError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open '{}': {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stat mapped file: {0}")]
    Stat(#[source] io::Error),

    #[error("Failed to map {len} bytes: {source}")]
    Map {
        len: usize,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Growth Errors
    // -------------------------------------------------------------------------
    #[error("Failed to pre-allocate {len} bytes at offset {offset}: {source}")]
    Allocate {
        offset: u64,
        len: u64,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remap from {from} to {to} bytes: {source}")]
    Remap {
        from: usize,
        to: usize,
        #[source]
        source: io::Error,
    },

    #[error("Region too small ({limit} bytes) for {requested} bytes, you must allocate a larger one in advance")]
    CapacityExhausted { requested: usize, limit: usize },

    #[error("Invalid size {size}: {reason}")]
    InvalidSize { size: usize, reason: &'static str },

    #[error("Mapped file already released")]
    Released,

    // -------------------------------------------------------------------------
    // Release Errors
    // -------------------------------------------------------------------------
    #[error("Failed to unmap region: {} (close: {})", .source, describe_close(.close))]
    Unmap {
        #[source]
        source: io::Error,
        close: Option<io::Error>,
    },

    #[error("Failed to close mapped file: {0}")]
    Close(#[source] io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_close(close: &Option<io::Error>) -> String {
    match close {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    }
}
