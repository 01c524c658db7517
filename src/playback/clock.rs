//! Playback Clock: the single loop that paces and advances frames.
//!
//! Each cycle asks the shared state what to do. When a frame is ready, the
//! audio is checked against that frame's timestamp, the frame is presented,
//! and the loop waits out the rest of the frame budget before advancing. The
//! wait is measured from the start of the cycle, so render time is part of
//! the budget and the cadence stays on tempo.

use super::state::{Gate, PlaybackState};
use super::sync::{SyncOutcome, Synchronizer};
use crate::audio::Transport;
use crate::cancel::CancelToken;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened when the sink was asked to show a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    /// The frame is on screen.
    Shown,
    /// The frame is not materialized yet; hold position and retry.
    Missing,
    /// The frame could not be decoded; skip it.
    Skipped,
}

/// Where the clock sends frames.
pub trait FrameSink {
    /// Show frame `index`.
    fn present(&mut self, index: u64) -> io::Result<Presented>;

    /// Redraw whatever depends on playback state while no frame is being
    /// shown (paused, ended).
    fn refresh(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Outcome of one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Frame `index` was handled and the index moved on.
    Advanced(u64),
    /// Nothing rendered: paused.
    Paused,
    /// Nothing rendered: waiting for the decoder.
    Waiting,
    /// End of stream.
    Ended,
    /// Cancelled or quit.
    Stopped,
}

/// Why the clock loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockExit {
    /// Every frame has been shown.
    Ended,
    /// Cancellation fired.
    Cancelled,
}

/// Clock configuration.
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    /// Time budget per frame.
    pub frame_budget: Duration,
    /// Longest a blocked clock sleeps before re-checking cancellation.
    pub poll_interval: Duration,
}

impl ClockConfig {
    /// Pacing for `frame_rate` frames per second.
    pub fn for_frame_rate(frame_rate: u32, poll_interval: Duration) -> Self {
        Self {
            frame_budget: Duration::from_secs(1) / frame_rate.max(1),
            poll_interval,
        }
    }
}

/// The playback clock.
pub struct PlaybackClock<S: FrameSink, T: Transport> {
    state: Arc<PlaybackState>,
    sink: S,
    sync: Option<Synchronizer<T>>,
    config: ClockConfig,
    cancel: CancelToken,
}

impl<S: FrameSink, T: Transport> PlaybackClock<S, T> {
    /// Create a clock presenting to `sink`.
    pub const fn new(
        state: Arc<PlaybackState>,
        sink: S,
        sync: Option<Synchronizer<T>>,
        config: ClockConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            state,
            sink,
            sync,
            config,
            cancel,
        }
    }

    /// The sink frames are presented to.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Run until end of stream or cancellation.
    pub fn run(mut self) -> ClockExit {
        loop {
            match self.step() {
                Cycle::Ended => {
                    tracing::info!("playback reached end of stream");
                    return ClockExit::Ended;
                }
                Cycle::Stopped => return ClockExit::Cancelled,
                Cycle::Advanced(_) | Cycle::Paused | Cycle::Waiting => {}
            }
        }
    }

    /// Run a single cycle.
    pub fn step(&mut self) -> Cycle {
        if self.cancel.is_cancelled() {
            return Cycle::Stopped;
        }

        let index = match self.state.gate(self.config.poll_interval) {
            Gate::Ready(index) => index,
            Gate::Paused => {
                self.refresh();
                return Cycle::Paused;
            }
            Gate::Waiting => return Cycle::Waiting,
            Gate::Ended => {
                self.refresh();
                return Cycle::Ended;
            }
            Gate::Stopped => return Cycle::Stopped,
        };

        let start = Instant::now();
        self.synchronize(index);

        match self.sink.present(index) {
            Ok(Presented::Shown) => self.state.mark_started(),
            Ok(Presented::Skipped) => tracing::debug!(index, "frame skipped"),
            Ok(Presented::Missing) => {
                if self.cancel.wait_timeout(self.config.poll_interval) {
                    return Cycle::Stopped;
                }
                return Cycle::Waiting;
            }
            Err(e) => tracing::warn!(index, error = %e, "failed to present frame"),
        }

        let elapsed = start.elapsed();
        if elapsed < self.config.frame_budget
            && self.cancel.wait_timeout(self.config.frame_budget - elapsed)
        {
            return Cycle::Stopped;
        }

        self.state.advance_from(index);
        Cycle::Advanced(index)
    }

    fn refresh(&mut self) {
        if let Err(e) = self.sink.refresh() {
            tracing::warn!(error = %e, "failed to refresh display");
        }
    }

    fn synchronize(&self, index: u64) {
        let Some(sync) = &self.sync else {
            return;
        };
        match sync.check(index) {
            Ok(SyncOutcome::InSync { .. } | SyncOutcome::Drained { .. }) => {}
            Ok(SyncOutcome::Corrected { from, to }) => {
                tracing::info!(index, from, to, "corrective audio seek");
            }
            Err(e) => tracing::warn!(index, error = %e, "audio sync check failed"),
        }
    }
}
