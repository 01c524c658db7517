//! Playback: shared state, the pacing clock, and A/V synchronization.

mod clock;
mod state;
mod sync;

pub use clock::{ClockConfig, ClockExit, Cycle, FrameSink, PlaybackClock, Presented};
pub use state::{clamp_stride, Gate, Phase, PlaybackState, Snapshot, MAX_STRIDE, MIN_STRIDE};
pub use sync::{SyncOutcome, Synchronizer};
