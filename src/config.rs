//! Player configuration.

use crate::actor::{KeyCode, KeyModifiers};
use crate::playback::clamp_stride;
use std::time::Duration;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Frame rate must be positive.
    #[error("frame rate must be at least 1 fps")]
    ZeroFrameRate,
    /// Poll interval must be positive.
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
    /// The command queue needs room for at least one command.
    #[error("command queue capacity must be non-zero")]
    ZeroCommandCapacity,
}

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Pause or resume.
    PauseToggle,
    /// Seek back one step.
    SeekBack,
    /// Seek forward one step.
    SeekForward,
    /// Finer sampling.
    ZoomIn,
    /// Coarser sampling.
    ZoomOut,
    /// Quit.
    Quit,
}

/// One key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    /// The key.
    pub code: KeyCode,
    /// Whether Control must be held.
    pub control: bool,
}

impl KeyBinding {
    /// A plain key.
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            control: false,
        }
    }

    /// Control plus a key.
    pub const fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            control: true,
        }
    }

    fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let code = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        self.code == code && self.control == modifiers.control
    }
}

/// Key-to-action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: Vec<(KeyBinding, Action)>,
}

impl KeyBindings {
    /// A table with no bindings.
    pub const fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `key` to `action`, replacing any earlier binding of that key.
    pub fn bind(&mut self, key: KeyBinding, action: Action) -> &mut Self {
        self.bindings.retain(|(k, _)| *k != key);
        self.bindings.push((key, action));
        self
    }

    /// The action bound to a key press, if any.
    pub fn lookup(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(key, _)| key.matches(code, modifiers))
            .map(|(_, action)| *action)
    }

    /// Keys bound to `action`.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = KeyBinding> + '_ {
        self.bindings
            .iter()
            .filter(move |(_, a)| *a == action)
            .map(|(key, _)| *key)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings
            .bind(KeyBinding::plain(KeyCode::Char(' ')), Action::PauseToggle)
            .bind(KeyBinding::plain(KeyCode::Char('a')), Action::SeekBack)
            .bind(KeyBinding::plain(KeyCode::Left), Action::SeekBack)
            .bind(KeyBinding::plain(KeyCode::Char('d')), Action::SeekForward)
            .bind(KeyBinding::plain(KeyCode::Right), Action::SeekForward)
            .bind(KeyBinding::plain(KeyCode::Char('f')), Action::ZoomIn)
            .bind(KeyBinding::plain(KeyCode::Char('r')), Action::ZoomOut)
            .bind(KeyBinding::plain(KeyCode::Char('q')), Action::Quit)
            .bind(KeyBinding::plain(KeyCode::Esc), Action::Quit)
            .bind(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        bindings
    }
}

/// Configuration for the player.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Frames per second, both extracted and displayed.
    pub frame_rate: u32,
    /// A/V drift tolerated before a corrective seek.
    pub drift_tolerance: Duration,
    /// Seek distance per key press.
    pub seek_step: Duration,
    /// Frame count poll interval; also the cancellation latency bound.
    pub poll_interval: Duration,
    /// Input poll timeout.
    pub input_poll_timeout: Duration,
    /// Starting sampling stride.
    pub initial_stride: u32,
    /// Audio command queue capacity.
    pub command_capacity: usize,
    /// Whether to play audio.
    pub audio: bool,
    /// Whether to use alternate screen buffer.
    pub alternate_screen: bool,
    /// Key bindings.
    pub bindings: KeyBindings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            drift_tolerance: Duration::from_secs(1),
            seek_step: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            input_poll_timeout: Duration::from_millis(10),
            initial_stride: 7,
            command_capacity: 1024,
            audio: true,
            alternate_screen: true,
            bindings: KeyBindings::default(),
        }
    }
}

impl PlayerConfig {
    /// Check the configuration, clamping the stride into range.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero frame rate, poll interval or queue capacity.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::ZeroCommandCapacity);
        }
        self.initial_stride = clamp_stride(self.initial_stride);
        Ok(self)
    }

    /// Frames covered by one seek step.
    pub fn seek_frames(&self) -> u64 {
        (self.seek_step.as_secs_f64() * f64::from(self.frame_rate)).round() as u64
    }
}
