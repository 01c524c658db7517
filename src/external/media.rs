//! Input media kind detection.

use image::ImageFormat;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Enough header bytes for every image signature `image` recognizes.
const SNIFF_LEN: u64 = 32;

/// What an input file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A still image: render once and exit.
    Image(ImageFormat),
    /// Anything else is handed to the extraction pipeline as video.
    Video,
}

impl MediaKind {
    /// Classify `path` by its header bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn detect(path: &Path) -> io::Result<Self> {
        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;
        Ok(Self::from_header(&header))
    }

    /// Classify by header bytes.
    ///
    /// Only formats this build can decode count as stills. Everything else,
    /// animated GIF included, goes to ffmpeg.
    pub fn from_header(header: &[u8]) -> Self {
        image::guess_format(header)
            .ok()
            .filter(ImageFormat::reading_enabled)
            .map_or(Self::Video, Self::Image)
    }
}
