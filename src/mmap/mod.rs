//! Mapped File Module
//!
//! Owns the raw virtual-memory side of the mapped backend.
//!
//! ## Responsibilities
//! - Create/open a file and pre-allocate its storage (`fallocate`)
//! - Map it shared, read/write, without swap reservation
//! - Grow the mapping in place or by relocation (`mremap(MREMAP_MAYMOVE)`)
//! - Unmap and close, reporting both failures
//!
//! ## Growth
//! ```text
//!  before:  file [##########.........]   map @A [##########]
//!  ensure_file_size(n):
//!    1. fstat           -> file length
//!    2. fallocate       -> file [##########==========]
//!    3. mremap @A -> @B -> map @B [##########..........]
//!                                  ^ same bytes, maybe new address
//! ```
//!
//! This is the only module that turns raw addresses into slices.

mod file;
mod sys;

pub use file::{Advice, MmapFile};
