//! Top-level error type.

use crate::audio::AudioError;
use crate::config::ConfigError;
use crate::external::ExtractError;
use crate::frame::FrameError;
use std::io;

/// Anything that can stop the player before or during setup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Audio could not be decoded or played.
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// An external extraction step failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// A still image could not be loaded.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Terminal, filesystem, or thread setup failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for player operations.
pub type Result<T> = std::result::Result<T, Error>;
