//! External collaborators: the temporary workspace and the ffmpeg processes
//! that fill it.
//!
//! ```text
//! media file ──ffmpeg──▶ <tmp>/audio.wav   (before playback, blocking)
//!            ──ffmpeg──▶ <tmp>/frames/N.jpg (during playback, incremental)
//! ```

mod ffmpeg;
mod media;
mod workspace;

pub use ffmpeg::{ExtractError, Ffmpeg, FrameExtractor};
pub use media::MediaKind;
pub use workspace::Workspace;
