//! Mapped-file buffer
//!
//! Adapts [`MmapFile`] to the [`Buffer`] contract. Growth preserves content:
//! the previous span is the prefix of the new mapping.

use std::path::Path;

use crate::error::Result;
use crate::mmap::MmapFile;

use super::{check_limit, Buffer, Enlarged};

/// Buffer backed by a pre-allocated, memory-mapped file
#[derive(Debug)]
pub struct MmapFileBuffer {
    mmf: MmapFile,
    limit: Option<usize>,
}

impl MmapFileBuffer {
    /// Open (or create) `path` and map `alloc_size` bytes of it
    pub fn open(path: &Path, alloc_size: usize) -> Result<Self> {
        let mmf = MmapFile::open(path, alloc_size)?;
        Ok(Self::from(mmf))
    }

    /// Refuse to grow past `limit` bytes
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// The mapped file this buffer wraps
    pub fn mmap_file(&self) -> &MmapFile {
        &self.mmf
    }
}

impl From<MmapFile> for MmapFileBuffer {
    fn from(mmf: MmapFile) -> Self {
        Self { mmf, limit: None }
    }
}

impl Buffer for MmapFileBuffer {
    fn bytes(&self) -> &[u8] {
        self.mmf.as_slice()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.mmf.as_mut_slice()
    }

    fn enlarge(&mut self, next_size: usize) -> Result<Enlarged<'_>> {
        check_limit(self.limit, next_size)?;

        // The old address may be gone after a remap, but its bytes are the
        // prefix of the new mapping either way.
        let previous_len = self.mmf.len();
        let (next, _remapped) = self.mmf.ensure_file_size(next_size)?;
        Ok(Enlarged::aliased(next, previous_len))
    }

    fn close(&mut self) -> Result<()> {
        self.mmf.release()
    }
}
