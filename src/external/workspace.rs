//! Temporary workspace for extracted frames and audio.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FRAMES_DIR: &str = "frames";
const AUDIO_FILE: &str = "audio.wav";

/// A private temporary directory holding `frames/` and `audio.wav`.
///
/// Everything in it is removed by [`cleanup`](Self::cleanup), or on drop as a
/// fallback.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    frames: PathBuf,
    audio: PathBuf,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("halfblock-").tempdir()?;
        Self::in_dir(dir)
    }

    /// Create a workspace under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn create_in(parent: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("halfblock-")
            .tempdir_in(parent)?;
        Self::in_dir(dir)
    }

    fn in_dir(dir: TempDir) -> io::Result<Self> {
        let frames = dir.path().join(FRAMES_DIR);
        std::fs::create_dir(&frames)?;
        let audio = dir.path().join(AUDIO_FILE);
        tracing::debug!(root = %dir.path().display(), "created workspace");
        Ok(Self { dir, frames, audio })
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the frame extractor writes into.
    pub fn frames_dir(&self) -> &Path {
        &self.frames
    }

    /// Where the audio extractor writes.
    pub fn audio_path(&self) -> &Path {
        &self.audio
    }

    /// Delete every artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    pub fn cleanup(self) -> io::Result<()> {
        let root = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(root = %root.display(), "removed workspace");
        Ok(())
    }
}
