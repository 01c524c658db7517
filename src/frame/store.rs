//! Frame stores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors reading from a frame store.
#[derive(Debug, thiserror::Error)]
pub enum FrameStoreError {
    /// The frame has not been materialized (yet). Not fatal: hold and retry.
    #[error("frame {0} is not available yet")]
    NotFound(u64),
    /// The store could not be read.
    #[error("failed to read frame {index}: {source}")]
    Io {
        /// Frame index.
        index: u64,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Read access to frames produced incrementally by an external decoder.
pub trait FrameStore: Send + Sync {
    /// Number of indexed frames currently materialized.
    fn count(&self) -> io::Result<u64>;

    /// Encoded bytes of frame `index` (1-based).
    fn read(&self, index: u64) -> Result<Vec<u8>, FrameStoreError>;
}

/// A directory of sequentially numbered frames: `1.jpg`, `2.jpg`, ...
#[derive(Debug, Clone)]
pub struct DirFrameStore {
    dir: PathBuf,
    extension: &'static str,
}

impl DirFrameStore {
    /// Extension the extraction pipeline writes.
    pub const DEFAULT_EXTENSION: &'static str = "jpg";

    /// A store of `.jpg` frames in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, Self::DEFAULT_EXTENSION)
    }

    /// A store of frames with a custom extension.
    pub fn with_extension(dir: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            dir: dir.into(),
            extension,
        }
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of frame `index`.
    pub fn path_of(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index}.{}", self.extension))
    }

    fn is_frame_name(&self, name: &str) -> bool {
        name.strip_suffix(self.extension)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl FrameStore for DirFrameStore {
    fn count(&self) -> io::Result<u64> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name().to_str().is_some_and(|name| self.is_frame_name(name)) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn read(&self, index: u64) -> Result<Vec<u8>, FrameStoreError> {
        fs::read(self.path_of(index)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FrameStoreError::NotFound(index)
            } else {
                FrameStoreError::Io { index, source }
            }
        })
    }
}
