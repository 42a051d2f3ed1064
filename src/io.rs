//! File access capability.
//!
//! Font and image files are read, and finished documents written, through a
//! [`ResourceLoader`]. The default [`FsLoader`] uses the local filesystem;
//! callers embedding the generator elsewhere supply their own implementation.

use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Blocking file access used for font/image loading and final output.
pub trait ResourceLoader: Send + Sync {
    /// Read the whole file.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or replace the file with `data`.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Size of the file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;
}

/// [`ResourceLoader`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl ResourceLoader for FsLoader {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        std::fs::write(path, data)?;
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Shared loader handle.
pub type SharedLoader = Arc<dyn ResourceLoader>;

/// Loader used when the configuration does not name one.
pub fn default_loader() -> SharedLoader {
    Arc::new(FsLoader)
}
