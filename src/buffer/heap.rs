//! Heap-backed buffer
//!
//! Every growth allocates a fresh zeroed span; nothing is copied.

use crate::error::Result;

use super::{check_limit, check_size, Buffer, BufferCreator, Enlarged};

/// Buffer backed by a plain `Vec<u8>`
#[derive(Debug, Default)]
pub struct HeapBuffer {
    data: Vec<u8>,

    /// Hard upper bound for `enlarge`, if any
    limit: Option<usize>,
}

impl HeapBuffer {
    /// Create a zeroed buffer of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            limit: None,
        }
    }

    /// Refuse to grow past `limit` bytes
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl Buffer for HeapBuffer {
    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Allocate-fresh growth: the old allocation is returned as the detached
    /// previous span and the new one starts zeroed.
    fn enlarge(&mut self, next_size: usize) -> Result<Enlarged<'_>> {
        check_limit(self.limit, next_size)?;

        let size = next_size.max(self.data.len());
        let previous = std::mem::replace(&mut self.data, vec![0; size]);
        Ok(Enlarged::detached(&mut self.data, previous))
    }

    fn close(&mut self) -> Result<()> {
        self.data = Vec::new();
        Ok(())
    }
}

/// Hands out [`HeapBuffer`]s
#[derive(Debug, Default, Clone)]
pub struct HeapBufferCreator {
    limit: Option<usize>,
}

impl HeapBufferCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a per-region growth limit to every buffer created
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl BufferCreator for HeapBufferCreator {
    fn create(&self, initial_size: usize) -> Result<Box<dyn Buffer>> {
        check_size(initial_size)?;
        check_limit(self.limit, initial_size)?;
        Ok(Box::new(HeapBuffer::new(initial_size).with_limit(self.limit)))
    }
}
