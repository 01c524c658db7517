//! ffmpeg collaborators: audio extraction and incremental frame extraction.

use crate::cancel::CancelToken;
use crate::frame::FrameStore;
use crate::playback::PlaybackState;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Errors from the extraction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The program ran and failed.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Its exit status.
        status: ExitStatus,
        /// The tail of its error output.
        stderr: String,
    },
    /// The watcher thread could not be spawned.
    #[error("failed to spawn extraction watcher: {0}")]
    Thread(#[source] io::Error),
}

/// How to invoke ffmpeg.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::with_program("ffmpeg")
    }
}

impl Ffmpeg {
    /// Use a specific ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self, input: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-nostdin")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }

    /// Extract the audio track of `input` to a 16-bit PCM WAV file, resampled
    /// to `channels` x `sample_rate`. Blocks until ffmpeg exits.
    ///
    /// # Errors
    ///
    /// Returns an error if ffmpeg cannot be started or fails.
    pub fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        channels: u16,
        sample_rate: u32,
    ) -> Result<(), ExtractError> {
        let result = self
            .command(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ac")
            .arg(channels.to_string())
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg(output)
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ExtractError::Spawn {
                program: self.name(),
                source,
            })?;

        if !result.status.success() {
            return Err(ExtractError::Failed {
                program: self.name(),
                status: result.status,
                stderr: stderr_tail(&result.stderr),
            });
        }
        tracing::info!(output = %output.display(), channels, sample_rate, "extracted audio");
        Ok(())
    }

    /// Start extracting `input` to `<frames_dir>/1.jpg, 2.jpg, ...` at
    /// `frame_rate` fps. Returns immediately; frames appear as ffmpeg works.
    ///
    /// # Errors
    ///
    /// Returns an error if ffmpeg cannot be started.
    pub fn spawn_frames(
        &self,
        input: &Path,
        frames_dir: &Path,
        frame_rate: u32,
    ) -> Result<Child, ExtractError> {
        self.command(input)
            .arg("-an")
            .arg("-vf")
            .arg(format!("fps={frame_rate}"))
            .arg("-q:v")
            .arg("2")
            .arg(frames_dir.join("%d.jpg"))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: self.name(),
                source,
            })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    const MAX: usize = 512;
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| text.len() - i <= MAX)
        .unwrap_or(text.len());
    text[start..].to_string()
}

/// Watches a running frame extraction.
///
/// When the extractor exits on its own, the final frame count is published
/// and the source marked complete. On cancellation the extractor is killed.
pub struct FrameExtractor {
    handle: Option<JoinHandle<()>>,
}

impl FrameExtractor {
    /// Watch `child`, which writes frames into `store`.
    ///
    /// # Arguments
    ///
    /// * `child` - The running extraction process.
    /// * `store` - The frame store it writes into.
    /// * `state` - Receives the final frame count.
    /// * `cancel` - Kills the extraction.
    /// * `poll_interval` - How often to check the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher thread cannot be spawned.
    pub fn watch<S>(
        child: Child,
        store: S,
        state: Arc<PlaybackState>,
        cancel: CancelToken,
        poll_interval: Duration,
    ) -> Result<Self, ExtractError>
    where
        S: FrameStore + 'static,
    {
        let handle = thread::Builder::new()
            .name("halfblock-extract".to_string())
            .spawn(move || Self::run_loop(child, &store, &state, &cancel, poll_interval))
            .map_err(ExtractError::Thread)?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    fn run_loop<S: FrameStore>(
        mut child: Child,
        store: &S,
        state: &PlaybackState,
        cancel: &CancelToken,
        poll_interval: Duration,
    ) {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        tracing::info!(%status, "frame extraction finished");
                    } else {
                        tracing::warn!(%status, "frame extraction failed");
                    }
                    break;
                }
                Ok(None) => {
                    if cancel.wait_timeout(poll_interval) {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::debug!("frame extraction killed");
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "lost track of frame extraction");
                    break;
                }
            }
        }

        match store.count() {
            Ok(count) => {
                tracing::info!(frames = count, "frame source complete");
                state.finish_source(count);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to count extracted frames");
                state.finish_source(state.frame_count());
            }
        }
    }

    /// Wait for the watcher to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DirFrameStore;
    use std::fs;
    use std::time::Instant;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let ffmpeg = Ffmpeg::with_program("/nonexistent/halfblock/ffmpeg");
        let dir = tempfile::tempdir().unwrap();
        let err = ffmpeg
            .extract_audio(Path::new("in.mp4"), &dir.path().join("a.wav"), 2, 48_000)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Spawn { .. }));

        let err = ffmpeg
            .spawn_frames(Path::new("in.mp4"), dir.path(), 30)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Spawn { .. }));
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail(b"  short\n"), "short");
        let long = "x".repeat(2_000);
        assert_eq!(stderr_tail(long.as_bytes()).len(), 512);
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_extraction_publishes_final_count() {
        let dir = tempfile::tempdir().unwrap();
        for i in 1..=4 {
            fs::write(dir.path().join(format!("{i}.jpg")), b"x").unwrap();
        }
        let state = Arc::new(PlaybackState::new(1));
        state.set_frame_count(3);

        let child = Command::new("true").spawn().unwrap();
        let extractor = FrameExtractor::watch(
            child,
            DirFrameStore::new(dir.path()),
            Arc::clone(&state),
            CancelToken::new(),
            Duration::from_millis(5),
        )
        .unwrap();
        extractor.join();

        assert!(state.is_source_complete());
        assert_eq!(state.frame_count(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(PlaybackState::new(1));
        let cancel = CancelToken::new();

        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let extractor = FrameExtractor::watch(
            child,
            DirFrameStore::new(dir.path()),
            Arc::clone(&state),
            cancel.clone(),
            Duration::from_millis(100),
        )
        .unwrap();

        let start = Instant::now();
        cancel.cancel();
        extractor.join();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!state.is_source_complete());
    }
}
