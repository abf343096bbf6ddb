//! # cachebuf
//!
//! Growable byte regions for the shards of an in-memory cache:
//! - One `Buffer` contract shared by every backend
//! - Heap-backed regions with allocate-fresh growth
//! - Memory-mapped, pre-allocated file regions with content-preserving growth
//! - A thread-safe creator that numbers region files sequentially
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Cache (one per instance)                   │
//! │              shard 0 │ shard 1 │ ... │ shard N               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ create(initial) / enlarge(n) / close()
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 BufferCreator / Buffer                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │ HeapBuffer  │          │  MmapFileBuffer  │
//!   │   (Vec)     │          │ (Sequential dir) │
//!   └─────────────┘          └────────┬─────────┘
//!                                     │
//!                                     ▼
//!                            ┌─────────────────┐
//!                            │    MmapFile     │
//!                            │ fallocate/mremap│
//!                            └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
#[cfg(target_os = "linux")]
pub mod mmap;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BufferError, Result};
pub use config::{Backend, Config};
pub use buffer::{Buffer, BufferCreator, Enlarged, HeapBuffer, HeapBufferCreator};
#[cfg(target_os = "linux")]
pub use buffer::{MmapFileBuffer, SequentialMmapCreator};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cachebuf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
