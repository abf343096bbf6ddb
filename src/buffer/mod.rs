//! Buffer Module
//!
//! The growable byte region a cache shard appends into, and the factories
//! that hand one out per shard.
//!
//! ## Responsibilities
//! - One contract (`Buffer`) for every backend: current bytes, grow, close
//! - One factory contract (`BufferCreator`), shared by all shards of a cache
//! - A growth result (`Enlarged`) that tells the caller whether it still has
//!   to move its live bytes
//!
//! ## Backends
//! ```text
//!  ┌──────────────────────┬──────────────────────────┬───────────────────┐
//!  │ Backend              │ enlarge()                │ previous()        │
//!  ├──────────────────────┼──────────────────────────┼───────────────────┤
//!  │ HeapBuffer           │ fresh zeroed Vec         │ old Vec (detached)│
//!  │ MmapFileBuffer       │ fallocate + mremap       │ prefix of next    │
//!  └──────────────────────┴──────────────────────────┴───────────────────┘
//! ```
//!
//! Callers never special-case a backend: after `enlarge` they call
//! `Enlarged::migrate` for the bytes they still need, which copies for
//! detached growth and does nothing when the backend preserved content.

mod heap;
#[cfg(target_os = "linux")]
mod mapped;
#[cfg(target_os = "linux")]
mod creator;

use std::ops::Range;

use crate::error::{BufferError, Result};

pub use heap::{HeapBuffer, HeapBufferCreator};
#[cfg(target_os = "linux")]
pub use mapped::MmapFileBuffer;
#[cfg(target_os = "linux")]
pub use creator::SequentialMmapCreator;

/// A growable byte region
///
/// A region is owned by exactly one shard; `&mut self` on every mutating
/// call means the owner serializes access.
pub trait Buffer: Send {
    /// The bytes currently valid for reading
    fn bytes(&self) -> &[u8];

    /// The bytes currently valid for writing
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Grow to at least `next_size` bytes
    ///
    /// On success the new span is at least `next_size` long and never shorter
    /// than before. Whether earlier writes are visible through it depends on
    /// the backend; see [`Enlarged::is_preserved`]. On failure the region is
    /// unchanged and still usable.
    fn enlarge(&mut self, next_size: usize) -> Result<Enlarged<'_>>;

    /// Release every resource held by the region
    ///
    /// Safe to call more than once; later calls do nothing.
    fn close(&mut self) -> Result<()>;

    fn len(&self) -> usize {
        self.bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

/// Creates one buffer per shard
pub trait BufferCreator: Send + Sync {
    fn create(&self, initial_size: usize) -> Result<Box<dyn Buffer>>;
}

/// Where the bytes that were valid before a growth now live
#[derive(Debug)]
enum Previous {
    /// Same memory as the first `len` bytes of the new span
    Aliased { len: usize },

    /// Separate allocation the caller must copy from
    Detached(Vec<u8>),
}

/// Result of [`Buffer::enlarge`]: the new span plus the span valid before the call
#[derive(Debug)]
pub struct Enlarged<'a> {
    next: &'a mut [u8],
    previous: Previous,
}

impl<'a> Enlarged<'a> {
    /// Growth whose previous span is the first `previous_len` bytes of `next`
    pub(crate) fn aliased(next: &'a mut [u8], previous_len: usize) -> Self {
        let len = previous_len.min(next.len());
        Self {
            next,
            previous: Previous::Aliased { len },
        }
    }

    /// Growth that handed back the old allocation untouched
    pub(crate) fn detached(next: &'a mut [u8], previous: Vec<u8>) -> Self {
        Self {
            next,
            previous: Previous::Detached(previous),
        }
    }

    /// The new span
    pub fn next(&self) -> &[u8] {
        &*self.next
    }

    pub fn next_mut(&mut self) -> &mut [u8] {
        &mut *self.next
    }

    /// The span that was valid immediately before the growth
    pub fn previous(&self) -> &[u8] {
        match &self.previous {
            Previous::Aliased { len } => &self.next[..*len],
            Previous::Detached(old) => old,
        }
    }

    /// True when earlier writes are already visible through `next()`
    pub fn is_preserved(&self) -> bool {
        matches!(self.previous, Previous::Aliased { .. })
    }

    /// Copy `live` from the previous span into the same offsets of the new one
    ///
    /// A no-op for preserved growth. Returns the new span.
    ///
    /// # Errors
    /// `InvalidSize` if `live` is reversed or reaches past the previous span.
    /// Nothing is copied in that case.
    pub fn migrate(&mut self, live: Range<usize>) -> Result<&mut [u8]> {
        if live.start > live.end {
            return Err(BufferError::InvalidSize {
                size: live.start,
                reason: "live range starts after it ends",
            });
        }
        if live.end > self.previous().len() {
            return Err(BufferError::InvalidSize {
                size: live.end,
                reason: "live range outside previous span",
            });
        }

        if let Previous::Detached(old) = &self.previous {
            self.next[live.clone()].copy_from_slice(&old[live]);
        }
        Ok(&mut *self.next)
    }
}

/// Reject growth past a configured per-region limit
pub(crate) fn check_limit(limit: Option<usize>, requested: usize) -> Result<()> {
    match limit {
        Some(limit) if requested > limit => Err(BufferError::CapacityExhausted { requested, limit }),
        _ => Ok(()),
    }
}

/// Reject zero-length regions
pub(crate) fn check_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(BufferError::InvalidSize {
            size,
            reason: "region must be at least one byte",
        });
    }
    Ok(())
}
