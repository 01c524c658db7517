//! Frames: decoded still images and the store the decoder writes them to.
//!
//! - [`Frame`]: an immutable RGB raster with its 1-based index
//! - [`FrameStore`]: read access to indexed, incrementally materialized frames
//! - [`DirFrameStore`]: a directory of `1.jpg`, `2.jpg`, ...
//! - [`FrameCountPoller`]: background task publishing the current frame count

mod poller;
mod store;

pub use poller::FrameCountPoller;
pub use store::{DirFrameStore, FrameStore, FrameStoreError};

use image::RgbImage;
use std::io;
use std::path::{Path, PathBuf};

/// Errors decoding a frame payload.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload is not a decodable image.
    #[error("frame {index} could not be decoded: {source}")]
    Decode {
        /// Frame index.
        index: u64,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The image file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// An immutable raster image with its position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    image: RgbImage,
}

impl Frame {
    /// Wrap an already decoded image.
    pub const fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Decode an encoded image (JPEG, PNG, ...) into a frame.
    pub fn decode(index: u64, bytes: &[u8]) -> Result<Self, FrameError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| FrameError::Decode { index, source })?
            .into_rgb8();
        Ok(Self { index, image })
    }

    /// Load a single image file as frame 1.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let bytes = std::fs::read(path).map_err(|source| FrameError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(1, &bytes)
    }

    /// 1-based index in the stream.
    #[inline]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the frame has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// The underlying raster.
    #[inline]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }
}
