//! Frame Count Poller: Dedicated thread publishing how many frames exist.
//!
//! The external decoder writes frames while playback runs. This actor polls
//! the store at a fixed interval and publishes the count to the shared
//! playback state, which gates how far the clock may advance.

use super::FrameStore;
use crate::cancel::CancelToken;
use crate::playback::PlaybackState;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poller actor handle.
pub struct FrameCountPoller {
    handle: Option<JoinHandle<()>>,
}

impl FrameCountPoller {
    /// Spawn the poller thread.
    ///
    /// # Arguments
    ///
    /// * `store` - The store being filled by the decoder.
    /// * `state` - Where to publish the count.
    /// * `cancel` - Stops the poller.
    /// * `interval` - Time between polls.
    pub fn spawn<S>(
        store: S,
        state: Arc<PlaybackState>,
        cancel: CancelToken,
        interval: Duration,
    ) -> io::Result<Self>
    where
        S: FrameStore + 'static,
    {
        let handle = thread::Builder::new()
            .name("halfblock-poller".to_string())
            .spawn(move || Self::run_loop(&store, &state, &cancel, interval))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the poller thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop<S: FrameStore>(
        store: &S,
        state: &PlaybackState,
        cancel: &CancelToken,
        interval: Duration,
    ) {
        loop {
            // Once the extractor has published the final count, it is exact.
            if state.is_source_complete() {
                break;
            }

            match store.count() {
                Ok(files) => state.set_frame_count(settled_count(files)),
                Err(e) => tracing::warn!(error = %e, "failed to count frames"),
            }

            if cancel.wait_timeout(interval) {
                break;
            }
        }
        tracing::debug!("frame poller stopped");
    }
}

/// The newest file may still be half written while the decoder runs.
const fn settled_count(files: u64) -> u64 {
    files.saturating_sub(1)
}
