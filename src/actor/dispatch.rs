//! Dispatcher: the single entry point from input events to transport actions.
//!
//! Which display surface is visible plays no part here. A key is looked up
//! once, and the resulting command is applied to the playback state and
//! forwarded to the audio actor without blocking.

use super::display::Viewport;
use super::messages::{InputEvent, TransportCommand};
use crate::audio::AudioTransport;
use crate::config::{Action, KeyBindings, PlayerConfig};
use crate::playback::{Phase, PlaybackState};
use std::sync::Arc;
use std::time::Duration;

/// Whether the main loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep running.
    Continue,
    /// Quit requested.
    Quit,
}

/// Routes input events to the playback state and the audio actor.
pub struct Dispatcher {
    bindings: KeyBindings,
    state: Arc<PlaybackState>,
    audio: Option<AudioTransport>,
    seek_step: Duration,
    seek_frames: i64,
    viewport: Arc<Viewport>,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the key bindings and seek step.
    /// * `state` - The shared playback state.
    /// * `audio` - The audio transport, if audio is playing.
    /// * `viewport` - Terminal size, updated on resize.
    pub fn new(
        config: &PlayerConfig,
        state: Arc<PlaybackState>,
        audio: Option<AudioTransport>,
        viewport: Arc<Viewport>,
    ) -> Self {
        Self {
            bindings: config.bindings.clone(),
            state,
            audio,
            seek_step: config.seek_step,
            seek_frames: i64::try_from(config.seek_frames()).unwrap_or(i64::MAX),
            viewport,
        }
    }

    /// Last known terminal size.
    pub fn viewport(&self) -> (u16, u16) {
        self.viewport.get()
    }

    /// Handle one input event.
    pub fn handle(&self, event: &InputEvent) -> Flow {
        match event {
            InputEvent::Key { code, modifiers } => match self.bindings.lookup(*code, *modifiers) {
                Some(action) => self.apply(self.command_for(action)),
                None => Flow::Continue,
            },
            InputEvent::Resize { width, height } => {
                self.viewport.set(*width, *height);
                Flow::Continue
            }
            InputEvent::Error(message) => {
                tracing::warn!(%message, "input error");
                Flow::Continue
            }
        }
    }

    /// The command an action produces.
    pub const fn command_for(&self, action: Action) -> TransportCommand {
        match action {
            Action::PauseToggle => TransportCommand::PauseToggle,
            Action::SeekBack => TransportCommand::SeekBack(self.seek_step),
            Action::SeekForward => TransportCommand::SeekForward(self.seek_step),
            Action::ZoomIn => TransportCommand::ZoomIn,
            Action::ZoomOut => TransportCommand::ZoomOut,
            Action::Quit => TransportCommand::Quit,
        }
    }

    /// Apply a command to the playback state and forward it to the audio.
    pub fn apply(&self, command: TransportCommand) -> Flow {
        match command {
            TransportCommand::PauseToggle => {
                let paused = self.state.toggle_pause();
                tracing::debug!(paused, "pause toggled");
                self.forward(command);
            }
            TransportCommand::SeekBack(_) => self.seek(-self.seek_frames, command),
            TransportCommand::SeekForward(_) => self.seek(self.seek_frames, command),
            TransportCommand::ZoomIn => {
                let stride = self.state.adjust_stride(-1);
                tracing::debug!(stride, "zoom in");
            }
            TransportCommand::ZoomOut => {
                let stride = self.state.adjust_stride(1);
                tracing::debug!(stride, "zoom out");
            }
            TransportCommand::Quit => {
                tracing::info!("quit requested");
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Seeks after the end are ignored, so the audio must not move either.
    fn seek(&self, frames: i64, command: TransportCommand) {
        if self.state.phase() == Phase::Ended {
            tracing::debug!(?command, "ignoring seek after end of stream");
            return;
        }
        let index = self.state.seek_by(frames);
        tracing::debug!(index, ?command, "seek");
        self.forward(command);
    }

    fn forward(&self, command: TransportCommand) {
        if let Some(audio) = &self.audio {
            audio.enqueue(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{KeyCode, KeyModifiers};
    use crate::audio::{PcmStream, SharedStream, Transport};
    use crate::cancel::CancelToken;
    use crate::playback::{MAX_STRIDE, MIN_STRIDE};
    use std::thread;

    fn dispatcher(audio: Option<AudioTransport>) -> (Dispatcher, Arc<PlaybackState>) {
        let config = PlayerConfig::default();
        let state = Arc::new(PlaybackState::new(config.initial_stride));
        state.set_frame_count(3_000);
        let dispatcher = Dispatcher::new(
            &config,
            Arc::clone(&state),
            audio,
            Arc::new(Viewport::new(80, 24)),
        );
        (dispatcher, state)
    }

    fn press(c: char) -> InputEvent {
        InputEvent::key(KeyCode::Char(c))
    }

    #[test]
    fn test_pause_key_toggles_state() {
        let (dispatcher, state) = dispatcher(None);
        assert_eq!(dispatcher.handle(&press(' ')), Flow::Continue);
        assert!(state.is_paused());
        dispatcher.handle(&press(' '));
        assert!(!state.is_paused());
    }

    #[test]
    fn test_seek_moves_index_by_step() {
        let (dispatcher, state) = dispatcher(None);
        dispatcher.handle(&press('d'));
        assert_eq!(state.index(), 31);
        dispatcher.handle(&InputEvent::key(KeyCode::Right));
        assert_eq!(state.index(), 61);
        dispatcher.handle(&press('a'));
        assert_eq!(state.index(), 31);
        for _ in 0..5 {
            dispatcher.handle(&press('a'));
        }
        assert_eq!(state.index(), 1);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (dispatcher, state) = dispatcher(None);
        for _ in 0..50 {
            dispatcher.handle(&press('f'));
        }
        assert_eq!(state.stride(), MIN_STRIDE);
        for _ in 0..50 {
            dispatcher.handle(&press('r'));
        }
        assert_eq!(state.stride(), MAX_STRIDE);
    }

    #[test]
    fn test_quit_keys() {
        let (dispatcher, _) = dispatcher(None);
        assert_eq!(dispatcher.handle(&press('q')), Flow::Quit);
        assert_eq!(dispatcher.handle(&InputEvent::key(KeyCode::Esc)), Flow::Quit);
        let ctrl_c = InputEvent::Key {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
        };
        assert_eq!(dispatcher.handle(&ctrl_c), Flow::Quit);
    }

    #[test]
    fn test_unbound_key_and_resize() {
        let (dispatcher, state) = dispatcher(None);
        let before = state.snapshot();
        assert_eq!(dispatcher.handle(&press('z')), Flow::Continue);
        assert_eq!(state.snapshot(), before);

        dispatcher.handle(&InputEvent::Resize {
            width: 200,
            height: 60,
        });
        assert_eq!(dispatcher.viewport(), (200, 60));
    }

    #[test]
    fn test_commands_reach_audio() {
        let stream = SharedStream::new(PcmStream::new(vec![0.0; 1_000], 1, 100).unwrap());
        let cancel = CancelToken::new();
        let (audio, actor) = AudioTransport::spawn(
            stream.clone(),
            16,
            cancel.clone(),
            Duration::from_millis(5),
        )
        .unwrap();
        let (dispatcher, _) = dispatcher(Some(audio));

        dispatcher.handle(&press('d'));
        dispatcher.handle(&press('d'));
        dispatcher.handle(&press(' '));

        for _ in 0..100 {
            if stream.position().unwrap() == 200 && stream.lock().unwrap().is_paused() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(stream.position().unwrap(), 200);
        assert!(stream.lock().unwrap().is_paused());

        cancel.cancel();
        actor.join();
    }

    #[test]
    fn test_seek_after_end_leaves_audio_alone() {
        let stream = SharedStream::new(PcmStream::new(vec![0.0; 1_000], 1, 100).unwrap());
        stream.seek_to(500).unwrap();
        let cancel = CancelToken::new();
        let (audio, actor) = AudioTransport::spawn(
            stream.clone(),
            16,
            cancel.clone(),
            Duration::from_millis(5),
        )
        .unwrap();
        let (dispatcher, state) = dispatcher(Some(audio));
        state.finish_source(0);
        state.gate(Duration::ZERO);
        assert_eq!(state.phase(), Phase::Ended);

        dispatcher.handle(&press('d'));
        dispatcher.handle(&press('a'));
        // commands are applied in order, so once the pause lands the seeks would have too
        dispatcher.handle(&press(' '));
        for _ in 0..100 {
            if stream.lock().unwrap().is_paused() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(stream.lock().unwrap().is_paused());
        assert_eq!(stream.position().unwrap(), 500);
        assert_eq!(state.index(), 1);

        cancel.cancel();
        actor.join();
    }
}
