//! Thin wrappers over the Linux virtual-memory system calls.
//!
//! Every function converts a failing return code into `io::Error::last_os_error()`
//! and leaves interpretation of the error to the caller.

use std::fs::File;
use std::io;
use std::os::unix::io::{IntoRawFd, RawFd};
use std::ptr::{self, NonNull};

/// Convert a byte count into `off_t`, rejecting values the kernel cannot represent.
pub(crate) fn to_off(value: u64) -> Option<libc::off_t> {
    libc::off_t::try_from(value).ok()
}

/// Reserve `len` bytes of file storage starting at `offset` (mode 0, no zero-fill writes).
pub(crate) fn fallocate(fd: RawFd, offset: libc::off_t, len: libc::off_t) -> io::Result<()> {
    let ret = unsafe { libc::fallocate(fd, 0, offset, len) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Map `len` bytes of `fd` from offset 0, shared and read/write, without reserving swap.
pub(crate) fn mmap_shared(fd: RawFd, len: usize) -> io::Result<NonNull<u8>> {
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED | libc::MAP_NORESERVE,
            fd,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(addr as *mut u8).ok_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable))
}

/// Resize a mapping, letting the kernel move it if it cannot grow in place.
///
/// # Safety
/// `addr`/`old_len` must describe a live mapping created by [`mmap_shared`].
/// On success the old address must no longer be dereferenced.
pub(crate) unsafe fn mremap(addr: NonNull<u8>, old_len: usize, new_len: usize) -> io::Result<NonNull<u8>> {
    let moved = libc::mremap(
        addr.as_ptr() as *mut libc::c_void,
        old_len,
        new_len,
        libc::MREMAP_MAYMOVE,
    );
    if moved == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(moved as *mut u8).ok_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable))
}

/// # Safety
/// `addr`/`len` must describe a live mapping that nothing references afterwards.
pub(crate) unsafe fn munmap(addr: NonNull<u8>, len: usize) -> io::Result<()> {
    if libc::munmap(addr.as_ptr() as *mut libc::c_void, len) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// # Safety
/// `addr`/`len` must describe a live mapping.
pub(crate) unsafe fn madvise(addr: NonNull<u8>, len: usize, advice: libc::c_int) -> io::Result<()> {
    if libc::madvise(addr.as_ptr() as *mut libc::c_void, len, advice) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Close a file and report the error that `Drop for File` would swallow.
pub(crate) fn close(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
