//! A/V Synchronizer: keeps the audio cursor near the displayed frame.
//!
//! Correction is coarse on purpose. Drift within the tolerance is left alone;
//! beyond it the audio is snapped to the frame's nominal position in one seek.

use crate::audio::{AudioError, Transport};
use std::time::Duration;

/// Result of one synchronization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Drift within tolerance; nothing done.
    InSync {
        /// Signed drift in sample frames (actual - expected).
        drift: i64,
    },
    /// The audio has played out while video continues; there is nothing
    /// left to seek to.
    Drained {
        /// Signed drift in sample frames (actual - expected).
        drift: i64,
    },
    /// A corrective seek was issued.
    Corrected {
        /// Cursor before the seek.
        from: usize,
        /// Cursor after the seek.
        to: usize,
    },
}

/// Compares the audio cursor with the frame index and corrects gross drift.
pub struct Synchronizer<T: Transport> {
    transport: T,
    frame_rate: u32,
    tolerance: usize,
}

impl<T: Transport> Synchronizer<T> {
    /// Create a synchronizer for frames at `frame_rate` fps, correcting
    /// drift larger than `tolerance`.
    pub fn new(transport: T, frame_rate: u32, tolerance: Duration) -> Self {
        let sample_rate = f64::from(transport.sample_rate());
        let tolerance = (tolerance.as_secs_f64() * sample_rate).round() as usize;
        Self {
            transport,
            frame_rate: frame_rate.max(1),
            tolerance,
        }
    }

    /// Drift tolerance in sample frames.
    pub const fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Audio position, in sample frames, that frame `index` should play
    /// against: whole seconds elapsed at that frame times the sample rate.
    pub fn expected_position(&self, index: u64) -> usize {
        let seconds = index / u64::from(self.frame_rate);
        let position = seconds.saturating_mul(u64::from(self.transport.sample_rate()));
        usize::try_from(position).unwrap_or(usize::MAX)
    }

    /// Check frame `index` against the audio cursor, seeking if needed.
    pub fn check(&self, index: u64) -> Result<SyncOutcome, AudioError> {
        let expected = self.expected_position(index);
        let actual = self.transport.position()?;

        let drift = actual as i64 - expected as i64;
        if actual.abs_diff(expected) <= self.tolerance {
            return Ok(SyncOutcome::InSync { drift });
        }

        // a seek would clamp to the last sample, where the cursor already is
        let last = self.transport.len()?.saturating_sub(1);
        if actual >= last && expected >= last {
            return Ok(SyncOutcome::Drained { drift });
        }

        let to = self.transport.seek_to(expected)?;
        tracing::debug!(index, from = actual, to, "corrected audio drift");
        Ok(SyncOutcome::Corrected { from: actual, to })
    }
}
