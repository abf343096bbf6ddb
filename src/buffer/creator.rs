//! Sequential mapped-file creator
//!
//! Names each new region file by an ascending decimal sequence number under
//! one directory: `{dir}/1`, `{dir}/2`, ...

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

use super::{check_limit, check_size, Buffer, BufferCreator, MmapFileBuffer};

/// Creates [`MmapFileBuffer`]s with unique, monotonically numbered files
///
/// ## Concurrency:
/// - `next_seq`: the lock is held for the whole of `create` (open, fallocate,
///   mmap), so two callers never pick the same file name
/// - the counter only advances after a successful creation
///
/// Files are never deleted or reopened by this type; each instance starts
/// counting at 1.
#[derive(Debug)]
pub struct SequentialMmapCreator {
    /// Directory the region files are created in
    dir: PathBuf,

    /// Sequence number of the next file
    next_seq: Mutex<u64>,

    /// Per-region growth limit
    limit: Option<usize>,
}

impl SequentialMmapCreator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_seq: Mutex::new(1),
            limit: None,
        }
    }

    /// Apply a per-region growth limit to every buffer created
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sequence number the next successful `create` will use
    pub fn next_seq(&self) -> u64 {
        *self.next_seq.lock()
    }

    /// Open a new mapped buffer and return it with its concrete type
    pub fn create_mapped(&self, initial_size: usize) -> Result<MmapFileBuffer> {
        check_size(initial_size)?;
        check_limit(self.limit, initial_size)?;

        let mut seq = self.next_seq.lock();
        let path = self.dir.join(seq.to_string());
        let buffer = MmapFileBuffer::open(&path, initial_size)?.with_limit(self.limit);
        *seq += 1;

        tracing::debug!("Created mapped region {} ({} bytes)", path.display(), initial_size);

        Ok(buffer)
    }
}

impl BufferCreator for SequentialMmapCreator {
    fn create(&self, initial_size: usize) -> Result<Box<dyn Buffer>> {
        Ok(Box::new(self.create_mapped(initial_size)?))
    }
}
