//! Player: the coordinator that ties actors together.
//!
//! Setup runs in order, and any failure aborts before the terminal is
//! touched:
//!
//! 1. temporary workspace
//! 2. audio extraction and decoding (skipped with audio off)
//! 3. frame extraction started in the background
//!
//! Then the terminal enters playback mode, the actors start, and the calling
//! thread becomes the UI event loop until a quit key or an OS interrupt.
//! Teardown happens in one place regardless of how playback ended: actors are
//! cancelled and joined, the terminal is restored, and the workspace is
//! deleted.

use super::display::{DisplayController, Viewport};
use super::dispatch::{Dispatcher, Flow};
use super::input::InputActor;
use super::messages::{InputEvent, TransportCommand};
use crate::audio::{
    decode_file, device_format, AudioActor, AudioOutput, AudioTransport, PcmStream, SharedStream,
};
use crate::cancel::CancelToken;
use crate::config::PlayerConfig;
use crate::error::Result;
use crate::external::{Ffmpeg, FrameExtractor, Workspace};
use crate::frame::{DirFrameStore, FrameCountPoller};
use crate::interrupt::Interrupt;
use crate::playback::{ClockConfig, ClockExit, PlaybackClock, PlaybackState, Synchronizer};
use crate::terminal::TerminalGuard;
use crate::widget::StatusBar;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Output format used when the audio device cannot be queried.
const FALLBACK_AUDIO_FORMAT: (u16, u32) = (2, 44_100);

/// Plays one media file in the terminal.
pub struct Player {
    config: PlayerConfig,
    ffmpeg: Ffmpeg,
}

impl Player {
    /// Create a player.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PlayerConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            ffmpeg: Ffmpeg::default(),
        })
    }

    /// Use a specific ffmpeg.
    #[must_use]
    pub fn with_ffmpeg(mut self, ffmpeg: Ffmpeg) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    /// The validated configuration.
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Play `input` until the user quits.
    ///
    /// Temporary artifacts are deleted before this returns, on success and
    /// on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails: extraction, audio decoding, or the
    /// terminal.
    pub fn play(&self, input: &Path) -> Result<()> {
        let interrupt = Interrupt::install()?;
        let workspace = Workspace::create()?;
        let result = self.play_in(&workspace, input, &interrupt);
        if let Err(e) = workspace.cleanup() {
            tracing::warn!(error = %e, "failed to remove temporary files");
        }
        result
    }

    fn play_in(&self, workspace: &Workspace, input: &Path, interrupt: &Interrupt) -> Result<()> {
        let config = &self.config;
        let pcm = if config.audio {
            Some(self.prepare_audio(input, workspace)?)
        } else {
            None
        };
        if interrupt.is_raised() {
            tracing::info!("interrupted during setup");
            return Ok(());
        }

        let state = Arc::new(PlaybackState::new(config.initial_stride));
        let cancel = CancelToken::new();
        let mut actors = Actors::new(Arc::clone(&state), cancel.clone());

        let store = DirFrameStore::new(workspace.frames_dir());
        let child = self
            .ffmpeg
            .spawn_frames(input, workspace.frames_dir(), config.frame_rate)?;
        actors.extractor = Some(FrameExtractor::watch(
            child,
            store.clone(),
            Arc::clone(&state),
            cancel.clone(),
            config.poll_interval,
        )?);

        let (width, height) = TerminalGuard::size()?;
        let viewport = Arc::new(Viewport::new(width, height));
        let _guard = TerminalGuard::enter(config.alternate_screen)?;
        // rebound after the guard so the actors stop before the terminal is restored
        let mut actors = actors;

        let (audio, _output) = match pcm {
            Some(pcm) => match Self::start_audio(pcm, config, &cancel)? {
                Some((transport, actor, output)) => {
                    actors.audio = Some(actor);
                    (Some(transport), Some(output))
                }
                None => (None, None),
            },
            None => (None, None),
        };

        actors.poller = Some(FrameCountPoller::spawn(
            store.clone(),
            Arc::clone(&state),
            cancel.clone(),
            config.poll_interval,
        )?);

        let mut display = DisplayController::new(
            store,
            Arc::clone(&state),
            Arc::clone(&viewport),
            StatusBar::new(config.frame_rate, &config.bindings),
            io::stdout(),
        );
        display.show_loading()?;

        let sync = audio
            .clone()
            .map(|t| Synchronizer::new(t, config.frame_rate, config.drift_tolerance));
        let clock = PlaybackClock::new(
            Arc::clone(&state),
            display,
            sync,
            ClockConfig::for_frame_rate(config.frame_rate, config.poll_interval),
            cancel.clone(),
        );
        actors.clock = Some(
            thread::Builder::new()
                .name("halfblock-clock".to_string())
                .spawn(move || clock.run())?,
        );

        let (input_tx, input_rx) = bounded::<InputEvent>(64);
        actors.input = Some(InputActor::spawn(
            input_tx,
            cancel.clone(),
            config.input_poll_timeout,
        )?);
        let dispatcher = Dispatcher::new(config, Arc::clone(&state), audio, viewport);

        tracing::info!(input = %input.display(), "playback started");
        let exit = run_ui(&input_rx, &dispatcher, interrupt, config.poll_interval);
        tracing::debug!(?exit, "ui loop finished");

        actors.shutdown();
        Ok(())
    }

    /// Extract and decode the audio track, in the output device's format.
    fn prepare_audio(&self, input: &Path, workspace: &Workspace) -> Result<PcmStream> {
        let (channels, sample_rate) = device_format().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not query audio device, using fallback format");
            FALLBACK_AUDIO_FORMAT
        });
        self.ffmpeg
            .extract_audio(input, workspace.audio_path(), channels, sample_rate)?;
        Ok(decode_file(workspace.audio_path())?)
    }

    /// Start the audio actor and the device output. Without a working
    /// device, playback continues silently.
    fn start_audio(
        pcm: PcmStream,
        config: &PlayerConfig,
        cancel: &CancelToken,
    ) -> Result<Option<(AudioTransport, AudioActor, AudioOutput)>> {
        let stream = SharedStream::new(pcm);
        let output = match AudioOutput::start(&stream) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "audio output unavailable, playing without sound");
                return Ok(None);
            }
        };
        let (transport, actor) = AudioTransport::spawn(
            stream,
            config.command_capacity,
            cancel.clone(),
            config.poll_interval,
        )?;
        Ok(Some((transport, actor, output)))
    }
}

/// How the UI loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    /// A quit key.
    Quit,
    /// A signal, handled as the quit command.
    Interrupted,
    /// The input actor went away.
    InputClosed,
}

/// Feed input events to the dispatcher until it asks to quit.
///
/// The interrupt flag is checked at least every `poll_interval`.
fn run_ui(
    events: &Receiver<InputEvent>,
    dispatcher: &Dispatcher,
    interrupt: &Interrupt,
    poll_interval: Duration,
) -> LoopExit {
    loop {
        if interrupt.is_raised() {
            tracing::info!("interrupted by signal");
            if dispatcher.apply(TransportCommand::Quit) == Flow::Quit {
                return LoopExit::Interrupted;
            }
        }
        match events.recv_timeout(poll_interval) {
            Ok(event) => {
                if dispatcher.handle(&event) == Flow::Quit {
                    return LoopExit::Quit;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("input actor stopped");
                return LoopExit::InputClosed;
            }
        }
    }
}

/// Every background actor of a playback session. Dropping it cancels and
/// joins them all, so early returns clean up too.
struct Actors {
    state: Arc<PlaybackState>,
    cancel: CancelToken,
    extractor: Option<FrameExtractor>,
    poller: Option<FrameCountPoller>,
    audio: Option<AudioActor>,
    input: Option<InputActor>,
    clock: Option<JoinHandle<ClockExit>>,
}

impl Actors {
    const fn new(state: Arc<PlaybackState>, cancel: CancelToken) -> Self {
        Self {
            state,
            cancel,
            extractor: None,
            poller: None,
            audio: None,
            input: None,
            clock: None,
        }
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        self.state.mark_quit();

        if let Some(input) = self.input.take() {
            input.join();
        }
        if let Some(clock) = self.clock.take() {
            match clock.join() {
                Ok(exit) => tracing::debug!(?exit, "clock stopped"),
                Err(_) => tracing::error!("clock thread panicked"),
            }
        }
        if let Some(audio) = self.audio.take() {
            audio.join();
        }
        if let Some(poller) = self.poller.take() {
            poller.join();
        }
        if let Some(extractor) = self.extractor.take() {
            extractor.join();
        }
        tracing::info!("playback stopped");
    }
}

impl Drop for Actors {
    fn drop(&mut self) {
        if self.clock.is_some()
            || self.input.is_some()
            || self.audio.is_some()
            || self.poller.is_some()
            || self.extractor.is_some()
        {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::KeyCode;
    use crate::config::ConfigError;
    use crate::error::Error;
    use crate::playback::Phase;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PlayerConfig {
            frame_rate: 0,
            ..PlayerConfig::default()
        };
        assert!(matches!(
            Player::new(config),
            Err(Error::Config(ConfigError::ZeroFrameRate))
        ));
    }

    #[test]
    fn test_stride_is_clamped_on_creation() {
        let config = PlayerConfig {
            initial_stride: 42,
            ..PlayerConfig::default()
        };
        assert_eq!(Player::new(config).unwrap().config().initial_stride, 10);
    }

    #[test]
    fn test_missing_ffmpeg_fails_before_terminal_setup() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, b"\0\0\0\x20ftypisom").unwrap();

        let config = PlayerConfig {
            audio: false,
            ..PlayerConfig::default()
        };
        let player = Player::new(config)
            .unwrap()
            .with_ffmpeg(Ffmpeg::with_program("/nonexistent/halfblock/ffmpeg"));
        assert!(matches!(player.play(&input), Err(Error::Extract(_))));
    }

    #[test]
    fn test_actors_drop_stops_threads() {
        let state = Arc::new(PlaybackState::new(1));
        let cancel = CancelToken::new();
        let mut actors = Actors::new(Arc::clone(&state), cancel.clone());
        let dir = tempfile::tempdir().unwrap();
        actors.poller = Some(
            FrameCountPoller::spawn(
                DirFrameStore::new(dir.path()),
                Arc::clone(&state),
                cancel.clone(),
                Duration::from_secs(10),
            )
            .unwrap(),
        );
        drop(actors);
        assert!(cancel.is_cancelled());
        assert_eq!(state.phase(), Phase::Quit);
    }

    fn session(config: &PlayerConfig) -> (Dispatcher, Arc<PlaybackState>) {
        let state = Arc::new(PlaybackState::new(config.initial_stride));
        let dispatcher = Dispatcher::new(
            config,
            Arc::clone(&state),
            None,
            Arc::new(Viewport::new(80, 24)),
        );
        (dispatcher, state)
    }

    #[test]
    fn test_quit_key_ends_session_and_removes_artifacts() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create_in(parent.path()).unwrap();
        let root = workspace.root().to_path_buf();
        std::fs::write(workspace.frames_dir().join("1.jpg"), b"frame").unwrap();
        std::fs::write(workspace.frames_dir().join("2.jpg"), b"frame").unwrap();
        std::fs::write(workspace.audio_path(), b"RIFF").unwrap();

        let config = PlayerConfig::default();
        let (dispatcher, state) = session(&config);
        let cancel = CancelToken::new();
        let mut actors = Actors::new(Arc::clone(&state), cancel.clone());
        actors.poller = Some(
            FrameCountPoller::spawn(
                DirFrameStore::new(workspace.frames_dir()),
                Arc::clone(&state),
                cancel.clone(),
                Duration::from_millis(5),
            )
            .unwrap(),
        );

        let (events, input_rx) = bounded(8);
        events.send(InputEvent::key(KeyCode::Char(' '))).unwrap();
        events.send(InputEvent::key(KeyCode::Char('q'))).unwrap();
        // never reached
        events.send(InputEvent::key(KeyCode::Char(' '))).unwrap();

        let exit = run_ui(
            &input_rx,
            &dispatcher,
            &Interrupt::detached(),
            Duration::from_millis(5),
        );
        assert_eq!(exit, LoopExit::Quit);
        assert!(state.is_paused());

        actors.shutdown();
        assert!(actors.poller.is_none());
        assert!(cancel.is_cancelled());
        assert_eq!(state.phase(), Phase::Quit);

        workspace.cleanup().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_closed_input_ends_loop() {
        let (dispatcher, _) = session(&PlayerConfig::default());
        let (events, input_rx) = bounded::<InputEvent>(1);
        drop(events);
        let exit = run_ui(
            &input_rx,
            &dispatcher,
            &Interrupt::detached(),
            Duration::from_millis(5),
        );
        assert_eq!(exit, LoopExit::InputClosed);
    }

    #[test]
    fn test_raised_interrupt_quits_without_input() {
        let (dispatcher, _) = session(&PlayerConfig::default());
        let (_events, input_rx) = bounded::<InputEvent>(1);
        let interrupt = Interrupt::detached();
        interrupt.raise();
        let exit = run_ui(&input_rx, &dispatcher, &interrupt, Duration::from_secs(10));
        assert_eq!(exit, LoopExit::Interrupted);
    }

    #[cfg(unix)]
    #[test]
    fn test_sigterm_quits_the_ui_loop() {
        let (dispatcher, _) = session(&PlayerConfig::default());
        let (_events, input_rx) = bounded::<InputEvent>(1);
        let interrupt = Interrupt::install().unwrap();

        signal_hook::low_level::raise(signal_hook::consts::SIGTERM).unwrap();
        assert!(interrupt.is_raised());

        let start = std::time::Instant::now();
        let exit = run_ui(&input_rx, &dispatcher, &interrupt, Duration::from_millis(5));
        assert_eq!(exit, LoopExit::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
