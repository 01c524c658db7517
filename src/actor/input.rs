//! Input Actor: the thread that owns terminal event reading.
//!
//! Key presses and resizes are translated into [`InputEvent`]s and sent to
//! the main loop. The thread stops when the session's cancel token fires or
//! the main loop hangs up.

use super::messages::{InputEvent, KeyCode, KeyModifiers};
use crate::cancel::CancelToken;
use crossbeam_channel::{SendTimeoutError, Sender};
use crossterm::event::{self, Event, KeyEventKind};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to the input thread.
pub struct InputActor {
    handle: Option<JoinHandle<()>>,
}

impl InputActor {
    /// Spawn the input thread.
    ///
    /// # Arguments
    ///
    /// * `events` - Where translated events go.
    /// * `cancel` - Stops the thread.
    /// * `poll_timeout` - Longest wait for a terminal event before the
    ///   cancel token is checked again.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(
        events: Sender<InputEvent>,
        cancel: CancelToken,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("halfblock-input".to_string())
            .spawn(move || Self::run_loop(&events, &cancel, poll_timeout))?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit. The cancel token must have fired.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(events: &Sender<InputEvent>, cancel: &CancelToken, poll_timeout: Duration) {
        while !cancel.is_cancelled() {
            let event = match event::poll(poll_timeout) {
                Ok(false) => continue,
                Ok(true) => match event::read() {
                    Ok(raw) => match Self::convert_event(raw) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => InputEvent::Error(e.to_string()),
                },
                Err(e) => InputEvent::Error(e.to_string()),
            };

            // a stalled main loop must not keep this thread from seeing the cancel
            match events.send_timeout(event, poll_timeout) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(event)) => {
                    tracing::debug!(?event, "input queue full, dropping event");
                }
                Err(SendTimeoutError::Disconnected(_)) => break,
            }
        }
        tracing::debug!("input actor stopped");
    }

    /// Convert a crossterm event to our `InputEvent`.
    fn convert_event(event: Event) -> Option<InputEvent> {
        match event {
            Event::Key(key_event) => {
                // Only process key press events (not release or repeat)
                if key_event.kind != KeyEventKind::Press {
                    return None;
                }

                let code = Self::convert_key_code(key_event.code)?;
                let modifiers = Self::convert_modifiers(key_event.modifiers);

                Some(InputEvent::Key { code, modifiers })
            }

            Event::Resize(width, height) => Some(InputEvent::Resize { width, height }),

            _ => None,
        }
    }

    /// Convert crossterm `KeyCode` to our `KeyCode`.
    const fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
        Some(match code {
            event::KeyCode::Char(c) => KeyCode::Char(c),
            event::KeyCode::Enter => KeyCode::Enter,
            event::KeyCode::Left => KeyCode::Left,
            event::KeyCode::Right => KeyCode::Right,
            event::KeyCode::Up => KeyCode::Up,
            event::KeyCode::Down => KeyCode::Down,
            event::KeyCode::Esc => KeyCode::Esc,
            _ => return None,
        })
    }

    /// Convert crossterm `KeyModifiers` to our `KeyModifiers`.
    fn convert_modifiers(mods: event::KeyModifiers) -> KeyModifiers {
        KeyModifiers {
            shift: mods.contains(event::KeyModifiers::SHIFT),
            control: mods.contains(event::KeyModifiers::CONTROL),
            alt: mods.contains(event::KeyModifiers::ALT),
        }
    }
}
