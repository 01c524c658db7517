//! Audio Transport: the command side of audio playback.
//!
//! The UI never touches the stream directly. It enqueues
//! [`TransportCommand`]s on a bounded channel, and a dedicated actor applies
//! them under the stream lock. A full queue drops the newest command so input
//! handling never blocks.

use super::{AudioError, PcmStream, SharedStream};
use crate::actor::TransportCommand;
use crate::cancel::CancelToken;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Position queries and seeks on a playing audio stream, in sample frames.
pub trait Transport: Send {
    /// Current cursor.
    fn position(&self) -> Result<usize, AudioError>;

    /// Stream length.
    fn len(&self) -> Result<usize, AudioError>;

    /// Whether the stream is empty.
    fn is_empty(&self) -> Result<bool, AudioError> {
        self.len().map(|len| len == 0)
    }

    /// Sample frames per second.
    fn sample_rate(&self) -> u32;

    /// Move the cursor to `position`, clamped into `[0, len - 1]`.
    /// Returns the position actually set.
    fn seek_to(&self, position: usize) -> Result<usize, AudioError>;
}

impl Transport for SharedStream {
    fn position(&self) -> Result<usize, AudioError> {
        Ok(self.lock()?.position())
    }

    fn len(&self) -> Result<usize, AudioError> {
        Ok(self.lock()?.len())
    }

    fn sample_rate(&self) -> u32 {
        Self::sample_rate(self)
    }

    fn seek_to(&self, position: usize) -> Result<usize, AudioError> {
        Ok(self.lock()?.seek(position))
    }
}

/// Apply one command to a locked stream.
///
/// Returns `false` for commands the audio side does not handle.
pub fn apply_command(stream: &mut PcmStream, command: &TransportCommand) -> bool {
    match command {
        TransportCommand::PauseToggle => {
            stream.toggle_pause();
        }
        TransportCommand::SeekBack(delta) => {
            stream.seek_back(*delta);
        }
        TransportCommand::SeekForward(delta) => {
            stream.seek_forward(*delta);
        }
        TransportCommand::ZoomIn | TransportCommand::ZoomOut | TransportCommand::Quit => {
            return false;
        }
    }
    true
}

/// Cloneable handle to the audio side: command queue plus the shared stream.
#[derive(Debug, Clone)]
pub struct AudioTransport {
    stream: SharedStream,
    commands: Sender<TransportCommand>,
}

impl AudioTransport {
    /// Create a transport and spawn the actor consuming its commands.
    ///
    /// # Arguments
    ///
    /// * `stream` - The shared PCM stream.
    /// * `capacity` - Command queue capacity.
    /// * `cancel` - Stops the actor.
    /// * `poll_interval` - How often the idle actor checks for cancellation.
    pub fn spawn(
        stream: SharedStream,
        capacity: usize,
        cancel: CancelToken,
        poll_interval: Duration,
    ) -> io::Result<(Self, AudioActor)> {
        let (commands, receiver) = bounded(capacity);
        let actor = AudioActor::spawn(stream.clone(), receiver, cancel, poll_interval)?;
        Ok((Self { stream, commands }, actor))
    }

    /// Enqueue a command without blocking.
    ///
    /// Returns `false` if the command was dropped (queue full or actor gone).
    pub fn enqueue(&self, command: TransportCommand) -> bool {
        match self.commands.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                tracing::debug!(?command, "audio command queue full, dropping command");
                false
            }
            Err(TrySendError::Disconnected(command)) => {
                tracing::debug!(?command, "audio actor gone, dropping command");
                false
            }
        }
    }

    /// The shared stream.
    pub const fn stream(&self) -> &SharedStream {
        &self.stream
    }
}

impl Transport for AudioTransport {
    fn position(&self) -> Result<usize, AudioError> {
        self.stream.position()
    }

    fn len(&self) -> Result<usize, AudioError> {
        self.stream.len()
    }

    fn sample_rate(&self) -> u32 {
        self.stream.sample_rate()
    }

    fn seek_to(&self, position: usize) -> Result<usize, AudioError> {
        self.stream.seek_to(position)
    }
}

/// Audio actor: applies queued commands to the stream.
pub struct AudioActor {
    handle: Option<JoinHandle<()>>,
}

impl AudioActor {
    fn spawn(
        stream: SharedStream,
        receiver: Receiver<TransportCommand>,
        cancel: CancelToken,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("halfblock-audio".to_string())
            .spawn(move || Self::run_loop(&stream, &receiver, &cancel, poll_interval))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the actor thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(
        stream: &SharedStream,
        receiver: &Receiver<TransportCommand>,
        cancel: &CancelToken,
        poll_interval: Duration,
    ) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            match receiver.recv_timeout(poll_interval) {
                Ok(command) => match stream.lock() {
                    Ok(mut pcm) => {
                        if apply_command(&mut pcm, &command) {
                            let position = pcm.position();
                            tracing::debug!(?command, position, "applied audio command");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, ?command, "dropping audio command"),
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!("audio actor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn mono(frames: usize, rate: u32) -> SharedStream {
        SharedStream::new(PcmStream::new(vec![0.0; frames], 1, rate).unwrap())
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_apply_command_ignores_display_commands() {
        let mut pcm = PcmStream::new(vec![0.0; 10], 1, 10).unwrap();
        assert!(!apply_command(&mut pcm, &TransportCommand::ZoomIn));
        assert!(!apply_command(&mut pcm, &TransportCommand::Quit));
        assert!(apply_command(&mut pcm, &TransportCommand::PauseToggle));
        assert!(pcm.is_paused());
    }

    #[test]
    fn test_actor_applies_commands() {
        let stream = mono(1_000, 100);
        let cancel = CancelToken::new();
        let (transport, actor) =
            AudioTransport::spawn(stream.clone(), 16, cancel.clone(), Duration::from_millis(5))
                .unwrap();

        assert!(transport.enqueue(TransportCommand::SeekForward(Duration::from_secs(3))));
        assert!(wait_until(|| transport.position().unwrap() == 300));

        assert!(transport.enqueue(TransportCommand::SeekBack(Duration::from_secs(1))));
        assert!(wait_until(|| transport.position().unwrap() == 200));

        assert!(transport.enqueue(TransportCommand::PauseToggle));
        assert!(wait_until(|| stream.lock().unwrap().is_paused()));

        cancel.cancel();
        actor.join();
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (commands, receiver) = bounded(2);
        let transport = AudioTransport {
            stream: mono(10, 10),
            commands,
        };

        assert!(transport.enqueue(TransportCommand::PauseToggle));
        assert!(transport.enqueue(TransportCommand::ZoomIn));
        assert!(!transport.enqueue(TransportCommand::ZoomOut));

        assert_eq!(receiver.try_recv().unwrap(), TransportCommand::PauseToggle);
        assert_eq!(receiver.try_recv().unwrap(), TransportCommand::ZoomIn);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_seek_to_clamps() {
        let stream = mono(50, 10);
        assert_eq!(stream.seek_to(10_000).unwrap(), 49);
        assert_eq!(stream.seek_to(0).unwrap(), 0);
    }
}
