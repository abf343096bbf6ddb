//! Mapped file
//!
//! One open file plus one shared mapping over its first `map_size` bytes.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;
use std::slice;

use crate::error::{BufferError, Result};

use super::sys;

/// Access pattern hints passed to `madvise` for the whole mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    /// No special treatment
    Normal,
    /// Expect page references in random order
    Random,
    /// Expect page references in sequential order
    Sequential,
    /// Expect access in the near future
    WillNeed,
    /// Do not expect access in the near future
    DontNeed,
}

impl Advice {
    fn as_raw(self) -> libc::c_int {
        match self {
            Advice::Normal => libc::MADV_NORMAL,
            Advice::Random => libc::MADV_RANDOM,
            Advice::Sequential => libc::MADV_SEQUENTIAL,
            Advice::WillNeed => libc::MADV_WILLNEED,
            Advice::DontNeed => libc::MADV_DONTNEED,
        }
    }
}

/// A pre-allocated file mapped shared and read/write into the process
///
/// ## Invariants:
/// - `map_size` is always the length of the live mapping at `ptr`
/// - bytes in `[0, old map_size)` survive `ensure_file_size`, even when the
///   mapping moves (the kernel only changes the virtual range, never the file)
/// - after `release` the mapping is gone, `file` is `None` and `map_size` is 0
///
/// Growth takes `&mut self`, so no slice handed out by `as_slice`/`as_mut_slice`
/// can outlive a relocation.
#[derive(Debug)]
pub struct MmapFile {
    /// Backing file, taken on release so the close error can be reported
    file: Option<File>,

    /// Base address of the current mapping
    ptr: NonNull<u8>,

    /// Length of the current mapping in bytes
    map_size: usize,

    released: bool,
}

// The mapping is owned exclusively by this value; shared access only hands out `&[u8]`.
unsafe impl Send for MmapFile {}
unsafe impl Sync for MmapFile {}

impl MmapFile {
    /// Open or create `path`, pre-allocate it to at least `alloc_size` bytes and map them
    ///
    /// Steps:
    /// 1. Open read/write, creating the file if needed (existing content is kept)
    /// 2. Stat to find the current end of file
    /// 3. `fallocate` the shortfall up to `alloc_size`
    /// 4. Map `alloc_size` bytes (`MAP_SHARED | MAP_NORESERVE`)
    pub fn open(path: &Path, alloc_size: usize) -> Result<Self> {
        if alloc_size == 0 {
            return Err(BufferError::InvalidSize {
                size: alloc_size,
                reason: "mapping must be at least one byte",
            });
        }
        let target = sys::to_off(alloc_size as u64).ok_or(BufferError::InvalidSize {
            size: alloc_size,
            reason: "exceeds the maximum file offset",
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|source| BufferError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let file_size = file.metadata().map_err(BufferError::Stat)?.len();
        // metadata lengths always fit in off_t
        let current = sys::to_off(file_size).unwrap_or(libc::off_t::MAX);
        if current < target {
            sys::fallocate(file.as_raw_fd(), current, target - current).map_err(|source| {
                BufferError::Allocate {
                    offset: file_size,
                    len: (target - current) as u64,
                    source,
                }
            })?;
        }

        let ptr = sys::mmap_shared(file.as_raw_fd(), alloc_size).map_err(|source| BufferError::Map {
            len: alloc_size,
            source,
        })?;

        tracing::trace!("Mapped {} bytes of {}", alloc_size, path.display());

        Ok(Self {
            file: Some(file),
            ptr,
            map_size: alloc_size,
            released: false,
        })
    }

    /// Grow the file and the mapping to at least `size` bytes
    ///
    /// Returns the current mapping and whether a remap happened. When `size`
    /// fits in the mapping nothing is remapped. On error the mapping and
    /// `map_size` are exactly as before the call; storage that was already
    /// pre-allocated stays allocated and a retry reuses it.
    pub fn ensure_file_size(&mut self, size: usize) -> Result<(&mut [u8], bool)> {
        if self.released {
            return Err(BufferError::Released);
        }
        let target = sys::to_off(size as u64).ok_or(BufferError::InvalidSize {
            size,
            reason: "exceeds the maximum file offset",
        })?;

        let file = self.file.as_ref().ok_or(BufferError::Released)?;
        let file_size = file.metadata().map_err(BufferError::Stat)?.len();
        let current = sys::to_off(file_size).unwrap_or(libc::off_t::MAX);
        if target > current {
            sys::fallocate(file.as_raw_fd(), current, target - current).map_err(|source| {
                BufferError::Allocate {
                    offset: file_size,
                    len: (target - current) as u64,
                    source,
                }
            })?;
        }

        let mut remapped = false;
        if size > self.map_size {
            // SAFETY: ptr/map_size describe our live mapping, and `&mut self`
            // guarantees no slice into it is alive across the call.
            let moved = unsafe { sys::mremap(self.ptr, self.map_size, size) }.map_err(|source| {
                BufferError::Remap {
                    from: self.map_size,
                    to: size,
                    source,
                }
            })?;
            tracing::trace!(
                "Remapped {} -> {} bytes (moved: {})",
                self.map_size,
                size,
                moved != self.ptr
            );
            self.ptr = moved;
            self.map_size = size;
            remapped = true;
        }

        Ok((self.as_mut_slice(), remapped))
    }

    /// The mapped bytes (empty after release)
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for map_size bytes while mapped; after release
        // ptr is dangling and map_size is 0, which is a valid empty slice.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.map_size) }
    }

    /// The mapped bytes, writable (empty after release)
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the borrow exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.map_size) }
    }

    /// Length of the current mapping
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    pub fn len(&self) -> usize {
        self.map_size
    }

    pub fn is_empty(&self) -> bool {
        self.map_size == 0
    }

    /// The underlying file, `None` once released
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Apply an access-pattern hint to the whole mapping
    pub fn advise(&self, advice: Advice) -> Result<()> {
        if self.released {
            return Err(BufferError::Released);
        }
        // SAFETY: ptr/map_size describe our live mapping.
        unsafe { sys::madvise(self.ptr, self.map_size, advice.as_raw()) }?;
        Ok(())
    }

    /// Unmap, then close the file
    ///
    /// The close is attempted even when unmapping fails. Calling this again
    /// after the first call is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // SAFETY: the mapping is live and, with `&mut self`, unreferenced.
        let unmapped = unsafe { sys::munmap(self.ptr, self.map_size) };
        self.ptr = NonNull::dangling();
        self.map_size = 0;

        let closed = match self.file.take() {
            Some(file) => sys::close(file),
            None => Ok(()),
        };

        match (unmapped, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(source), close) => Err(BufferError::Unmap {
                source,
                close: close.err(),
            }),
            (Ok(()), Err(e)) => Err(BufferError::Close(e)),
        }
    }
}

impl Drop for MmapFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to release mapped file on drop: {}", e);
        }
    }
}
