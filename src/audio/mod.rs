//! Audio: decoded PCM, its transport controls, and device output.
//!
//! ```text
//! ┌──────────────┐ TransportCommand ┌─────────────┐
//! │  Dispatcher  │ ───────────────▶ │ Audio Actor │──┐
//! └──────────────┘   (bounded)      └─────────────┘  │ lock
//!                                                    ▼
//! ┌──────────────┐   seek_to        ┌─────────────────────┐   lock   ┌─────────────┐
//! │ Synchronizer │ ───────────────▶ │ SharedStream (PCM)  │ ◀─────── │ cpal output │
//! └──────────────┘                  └─────────────────────┘          └─────────────┘
//! ```

mod decode;
mod output;
mod stream;
mod transport;

pub use decode::decode_file;
pub use output::{device_format, AudioOutput};
pub use stream::{PcmStream, SharedStream};
pub use transport::{apply_command, AudioActor, AudioTransport, Transport};

use std::io;
use std::path::PathBuf;

/// Errors opening, decoding or playing audio.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The audio file could not be opened.
    #[error("failed to open audio file {}: {source}", path.display())]
    Open {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The container or codec could not be read.
    #[error("failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    /// The file has no decodable audio track.
    #[error("no audio track found")]
    NoTrack,
    /// The track does not declare its sample rate.
    #[error("audio track has no sample rate")]
    UnknownSampleRate,
    /// Channel count or sample rate is zero.
    #[error("invalid audio format: {channels} channels at {sample_rate} Hz")]
    InvalidFormat {
        /// Channel count.
        channels: u16,
        /// Sample rate.
        sample_rate: u32,
    },
    /// No output device is available.
    #[error("no audio output device available")]
    NoDevice,
    /// The output device's configuration could not be queried.
    #[error("failed to query audio output device: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    /// The output device uses a sample format we don't write.
    #[error("unsupported output sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
    /// The output stream could not be created.
    #[error("failed to build audio output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    /// The output stream could not be started.
    #[error("failed to start audio output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    /// A thread panicked while holding the stream lock.
    #[error("audio stream lock poisoned")]
    LockPoisoned,
}
