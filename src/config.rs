//! Configuration for cachebuf
//!
//! Selects the buffer backend and region sizing, and builds the matching
//! creator.

use std::path::{Path, PathBuf};

use crate::buffer::{BufferCreator, HeapBufferCreator};
use crate::error::{BufferError, Result};

/// Which backend regions are allocated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Plain process heap, allocate-fresh growth
    Heap,

    /// One pre-allocated, memory-mapped file per region under `dir`
    /// (Linux only)
    MappedFile { dir: PathBuf },
}

/// Main configuration for a set of shard buffers
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backend Configuration
    // -------------------------------------------------------------------------
    /// Storage behind each region
    pub backend: Backend,

    // -------------------------------------------------------------------------
    // Sizing Configuration
    // -------------------------------------------------------------------------
    /// Size of a freshly created region (in bytes)
    pub initial_size: usize,

    /// Hard maximum a region may grow to (in bytes), unbounded if `None`
    pub max_region_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Heap,
            initial_size: 1024 * 1024, // 1 MB
            max_region_size: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check sizes for consistency
    pub fn validate(&self) -> Result<()> {
        if self.initial_size == 0 {
            return Err(BufferError::Config(
                "initial_size must be greater than zero".to_string(),
            ));
        }
        if let Some(max) = self.max_region_size {
            if max < self.initial_size {
                return Err(BufferError::Config(format!(
                    "max_region_size ({}) is smaller than initial_size ({})",
                    max, self.initial_size
                )));
            }
        }
        Ok(())
    }

    /// Build the creator for the configured backend
    ///
    /// For the mapped backend the directory is created if missing.
    pub fn creator(&self) -> Result<Box<dyn BufferCreator>> {
        self.validate()?;

        match &self.backend {
            Backend::Heap => Ok(Box::new(
                HeapBufferCreator::new().with_limit(self.max_region_size),
            )),
            Backend::MappedFile { dir } => self.mapped_creator(dir),
        }
    }

    #[cfg(target_os = "linux")]
    fn mapped_creator(&self, dir: &Path) -> Result<Box<dyn BufferCreator>> {
        std::fs::create_dir_all(dir)?;
        Ok(Box::new(
            crate::buffer::SequentialMmapCreator::new(dir).with_limit(self.max_region_size),
        ))
    }

    #[cfg(not(target_os = "linux"))]
    fn mapped_creator(&self, _dir: &Path) -> Result<Box<dyn BufferCreator>> {
        Err(BufferError::Config(
            "mapped-file backend requires Linux".to_string(),
        ))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Use the heap backend
    pub fn heap(mut self) -> Self {
        self.config.backend = Backend::Heap;
        self
    }

    /// Use the mapped-file backend rooted at `dir`
    pub fn mapped_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.backend = Backend::MappedFile { dir: dir.into() };
        self
    }

    /// Set the initial region size (in bytes)
    pub fn initial_size(mut self, size: usize) -> Self {
        self.config.initial_size = size;
        self
    }

    /// Set the hard maximum region size (in bytes)
    pub fn max_region_size(mut self, size: usize) -> Self {
        self.config.max_region_size = Some(size);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
