//! Shared playback state: the few scalar knobs every loop looks at.
//!
//! The clock writes `index`, the input dispatcher writes `paused`/`stride`,
//! the frame poller writes `frame_count`. All of them live behind one mutex
//! with a condition variable that is notified on every change, so waiters
//! (a paused clock, a clock waiting for the decoder) wake as soon as the
//! condition they wait on may have changed.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Smallest sampling stride (full resolution).
pub const MIN_STRIDE: u32 = 1;
/// Largest sampling stride.
pub const MAX_STRIDE: u32 = 10;

/// Clamp a stride into the supported range.
pub const fn clamp_stride(stride: u32) -> u32 {
    if stride < MIN_STRIDE {
        MIN_STRIDE
    } else if stride > MAX_STRIDE {
        MAX_STRIDE
    } else {
        stride
    }
}

/// Playback phase.
///
/// ```text
/// Loading ──▶ Playing ⇄ Paused ──▶ Ended
///    └──────────┴─────────┴──────────┴──▶ Quit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No frame has been shown yet.
    Loading,
    /// Frames are advancing.
    Playing,
    /// The displayed frame is frozen.
    Paused,
    /// The last frame has been shown and the source is complete.
    Ended,
    /// Shutting down.
    Quit,
}

/// What the clock should do on its next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Render this frame index.
    Ready(u64),
    /// Paused; nothing to render.
    Paused,
    /// The next frame is not materialized yet.
    Waiting,
    /// End of stream reached.
    Ended,
    /// Quit was requested.
    Stopped,
}

/// A consistent copy of the knobs, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Frame index the clock will render next (1-based).
    pub index: u64,
    /// Whether playback is paused.
    pub paused: bool,
    /// Current sampling stride.
    pub stride: u32,
    /// Frames materialized so far.
    pub frame_count: u64,
    /// Current phase.
    pub phase: Phase,
}

#[derive(Debug)]
struct Knobs {
    index: u64,
    paused: bool,
    stride: u32,
    frame_count: u64,
    source_complete: bool,
    started: bool,
    ended: bool,
    quit: bool,
}

impl Knobs {
    const fn phase(&self) -> Phase {
        if self.quit {
            Phase::Quit
        } else if self.ended {
            Phase::Ended
        } else if self.paused {
            Phase::Paused
        } else if self.started {
            Phase::Playing
        } else {
            Phase::Loading
        }
    }

    /// Clock cannot make progress right now and should sleep.
    const fn blocked(&self) -> bool {
        !self.quit
            && !self.ended
            && (self.paused || (self.index > self.frame_count && !self.source_complete))
    }
}

/// Process-wide playback knobs, owned by the clock and shared by reference.
#[derive(Debug)]
pub struct PlaybackState {
    knobs: Mutex<Knobs>,
    changed: Condvar,
}

impl PlaybackState {
    /// Create the state at frame 1, unpaused, with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            knobs: Mutex::new(Knobs {
                index: 1,
                paused: false,
                stride: clamp_stride(stride),
                frame_count: 0,
                source_complete: false,
                started: false,
                ended: false,
                quit: false,
            }),
            changed: Condvar::new(),
        }
    }

    // The knobs are plain scalars; a panic while holding the lock can't leave
    // them half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Knobs> {
        self.knobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut Knobs) -> R) -> R {
        let result = f(&mut self.lock());
        self.changed.notify_all();
        result
    }

    /// Take a consistent copy of all knobs.
    pub fn snapshot(&self) -> Snapshot {
        let knobs = self.lock();
        Snapshot {
            index: knobs.index,
            paused: knobs.paused,
            stride: knobs.stride,
            frame_count: knobs.frame_count,
            phase: knobs.phase(),
        }
    }

    /// Frame index the clock will render next.
    pub fn index(&self) -> u64 {
        self.lock().index
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Current sampling stride.
    pub fn stride(&self) -> u32 {
        self.lock().stride
    }

    /// Frames materialized so far.
    pub fn frame_count(&self) -> u64 {
        self.lock().frame_count
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    /// Whether the decoder has finished producing frames.
    pub fn is_source_complete(&self) -> bool {
        self.lock().source_complete
    }

    /// Flip the paused flag. Returns the new value.
    pub fn toggle_pause(&self) -> bool {
        self.update(|k| {
            k.paused = !k.paused;
            k.paused
        })
    }

    /// Move the index by `delta` frames, clamped to `[1, frame_count]`.
    ///
    /// Ignored once playback has ended. Returns the resulting index.
    pub fn seek_by(&self, delta: i64) -> u64 {
        self.update(|k| {
            if k.ended {
                return k.index;
            }
            let last = k.frame_count.max(1);
            let target = k.index.saturating_add_signed(delta);
            k.index = target.clamp(1, last);
            k.index
        })
    }

    /// Change the stride by `delta`, clamped to `[MIN_STRIDE, MAX_STRIDE]`.
    /// Returns the new stride.
    pub fn adjust_stride(&self, delta: i32) -> u32 {
        self.update(|k| {
            let stride = i64::from(k.stride) + i64::from(delta);
            k.stride = stride.clamp(i64::from(MIN_STRIDE), i64::from(MAX_STRIDE)) as u32;
            k.stride
        })
    }

    /// Publish the number of materialized frames.
    ///
    /// Ignored after [`finish_source`](Self::finish_source): a poll that
    /// raced with the final count must not overwrite it.
    pub fn set_frame_count(&self, count: u64) {
        self.update(|k| {
            if !k.source_complete {
                k.frame_count = count;
            }
        });
    }

    /// Publish the final frame count and mark the source complete.
    pub fn finish_source(&self, count: u64) {
        self.update(|k| {
            k.frame_count = count;
            k.source_complete = true;
        });
    }

    /// Record that a frame has been shown.
    pub fn mark_started(&self) {
        let mut knobs = self.lock();
        if !knobs.started {
            knobs.started = true;
            drop(knobs);
            self.changed.notify_all();
        }
    }

    /// Request shutdown; wakes every waiter.
    pub fn mark_quit(&self) {
        self.update(|k| k.quit = true);
    }

    /// Advance past `index`, unless someone (a seek) moved the index while
    /// that frame was being shown. Returns whether the index advanced.
    pub fn advance_from(&self, index: u64) -> bool {
        self.update(|k| {
            if k.index == index {
                k.index += 1;
                true
            } else {
                false
            }
        })
    }

    /// Decide the clock's next step, sleeping up to `timeout` while the clock
    /// is blocked (paused, or waiting for the decoder).
    pub fn gate(&self, timeout: Duration) -> Gate {
        let knobs = self.lock();
        let (mut knobs, _) = self
            .changed
            .wait_timeout_while(knobs, timeout, |k| k.blocked())
            .unwrap_or_else(PoisonError::into_inner);

        if knobs.quit {
            Gate::Stopped
        } else if knobs.ended {
            Gate::Ended
        } else if knobs.paused {
            Gate::Paused
        } else if knobs.index <= knobs.frame_count {
            Gate::Ready(knobs.index)
        } else if knobs.source_complete {
            knobs.ended = true;
            drop(knobs);
            self.changed.notify_all();
            Gate::Ended
        } else {
            Gate::Waiting
        }
    }
}
