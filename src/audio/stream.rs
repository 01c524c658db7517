//! The decoded PCM stream and its shared, lock-protected handle.

use super::AudioError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Interleaved `f32` PCM with a playback cursor.
///
/// Positions and lengths are in sample frames (one sample per channel).
#[derive(Debug, Clone)]
pub struct PcmStream {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    cursor: usize,
    paused: bool,
}

impl PcmStream {
    /// Wrap interleaved samples. `channels` must be non-zero.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, AudioError> {
        if channels == 0 || sample_rate == 0 {
            return Err(AudioError::InvalidFormat {
                channels,
                sample_rate,
            });
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
            cursor: 0,
            paused: false,
        })
    }

    /// Channel count.
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample frames per second.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in sample frames.
    pub fn len(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Whether the stream holds no audio.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor in sample frames.
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Whether output is paused.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Flip the paused flag. Returns the new value.
    pub const fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Number of sample frames in `duration`.
    pub fn frames_in(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize
    }

    /// Clamp a position into `[0, len - 1]`.
    pub fn clamp(&self, position: usize) -> usize {
        position.min(self.len().saturating_sub(1))
    }

    /// Move the cursor, clamped into `[0, len - 1]`. Returns the new cursor.
    pub fn seek(&mut self, position: usize) -> usize {
        self.cursor = self.clamp(position);
        self.cursor
    }

    /// Move the cursor back by `delta`, clamped.
    pub fn seek_back(&mut self, delta: Duration) -> usize {
        let frames = self.frames_in(delta);
        self.seek(self.cursor.saturating_sub(frames))
    }

    /// Move the cursor forward by `delta`, clamped.
    pub fn seek_forward(&mut self, delta: Duration) -> usize {
        let frames = self.frames_in(delta);
        self.seek(self.cursor.saturating_add(frames))
    }

    /// Fill an interleaved output buffer and advance the cursor.
    ///
    /// Paused or exhausted streams produce silence.
    pub fn fill(&mut self, out: &mut [f32]) {
        if self.paused {
            out.fill(0.0);
            return;
        }

        let channels = usize::from(self.channels);
        let start = self.cursor * channels;
        let available = self.samples.len().saturating_sub(start);
        // whole frames only
        let n = available.min(out.len()) / channels * channels;

        out[..n].copy_from_slice(&self.samples[start..start + n]);
        out[n..].fill(0.0);
        self.cursor += n / channels;
    }
}

/// The PCM stream shared between the output callback, the command loop and
/// the synchronizer. Every read or write of the cursor goes through its lock.
#[derive(Debug, Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<PcmStream>>,
    // immutable for the stream's lifetime, readable without the lock
    sample_rate: u32,
    channels: u16,
}

impl SharedStream {
    /// Share a stream.
    pub fn new(stream: PcmStream) -> Self {
        Self {
            sample_rate: stream.sample_rate(),
            channels: stream.channels(),
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// Lock the stream.
    pub fn lock(&self) -> Result<MutexGuard<'_, PcmStream>, AudioError> {
        self.inner.lock().map_err(|_| AudioError::LockPoisoned)
    }

    /// Sample frames per second.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.
    pub const fn channels(&self) -> u16 {
        self.channels
    }
}
