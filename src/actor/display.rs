//! Double-Buffered Display Controller.
//!
//! Two output surfaces alternate. A frame is composed completely into the
//! inactive surface (frame rows, status lines, clear-below), then the
//! surfaces swap and the newly active one is written to the terminal in a
//! single flush. The visible screen never shows a half-written frame.

use crate::frame::{Frame, FrameStore, FrameStoreError};
use crate::playback::{FrameSink, Phase, PlaybackState, Presented, Snapshot};
use crate::render::render_into;
use crate::terminal::OutputBuffer;
use crate::widget::StatusBar;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const LOADING: &str = "Loading...";

/// Terminal size shared between the input side (which sees resizes) and
/// the display (which clips to it).
#[derive(Debug)]
pub struct Viewport(AtomicU32);

impl Viewport {
    /// A viewport of `width` columns by `height` rows.
    pub const fn new(width: u16, height: u16) -> Self {
        Self(AtomicU32::new(pack(width, height)))
    }

    /// Record a new size.
    pub fn set(&self, width: u16, height: u16) {
        self.0.store(pack(width, height), Ordering::Relaxed);
    }

    /// Current (columns, rows).
    pub fn get(&self) -> (u16, u16) {
        let packed = self.0.load(Ordering::Relaxed);
        ((packed >> 16) as u16, (packed & 0xffff) as u16)
    }
}

const fn pack(width: u16, height: u16) -> u32 {
    ((width as u32) << 16) | height as u32
}

/// Presents frames from a store on a terminal.
pub struct DisplayController<S: FrameStore, W: Write> {
    store: S,
    state: Arc<PlaybackState>,
    viewport: Arc<Viewport>,
    status: StatusBar,
    out: W,
    /// Surfaces A and B.
    surfaces: [OutputBuffer; 2],
    /// Index of the visible surface.
    active: usize,
    /// Frame rows on screen, where the status lines start.
    frame_lines: usize,
    /// Snapshot the status lines were last drawn from.
    last_status: Option<Snapshot>,
}

impl<S: FrameStore, W: Write> DisplayController<S, W> {
    /// Create a controller.
    ///
    /// # Arguments
    ///
    /// * `store` - Where frames are read from.
    /// * `state` - Shared playback state, for stride and status.
    /// * `viewport` - Terminal size, kept current by the input side.
    /// * `status` - The status overlay.
    /// * `out` - The terminal (or any writer).
    pub fn new(
        store: S,
        state: Arc<PlaybackState>,
        viewport: Arc<Viewport>,
        status: StatusBar,
        out: W,
    ) -> Self {
        Self {
            store,
            state,
            viewport,
            status,
            out,
            surfaces: [OutputBuffer::raw(64 * 1024), OutputBuffer::raw(64 * 1024)],
            active: 0,
            frame_lines: 0,
            last_status: None,
        }
    }

    /// Index of the visible surface (0 = A, 1 = B).
    pub const fn active_surface(&self) -> usize {
        self.active
    }

    /// The writer frames go to.
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Show the loading screen.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn show_loading(&mut self) -> io::Result<()> {
        let surface = &mut self.surfaces[1 - self.active];
        surface.clear();
        surface.clear_screen();
        surface.cursor_move(0, 0);
        surface.write_str(LOADING);
        surface.end_line();
        self.swap()
    }

    /// Compose `frame` into the inactive surface.
    fn compose(&mut self, frame: &Frame) {
        let snapshot = self.snapshot();
        let (cols, rows) = self.viewport.get();
        let budget = usize::from(rows).saturating_sub(StatusBar::LINES);

        let surface = &mut self.surfaces[1 - self.active];
        surface.clear();
        surface.cursor_move(0, 0);
        self.frame_lines = render_into(frame, snapshot.stride, budget, surface);
        self.status.render_into(&snapshot, usize::from(cols), surface);
        surface.clear_below();
        self.last_status = Some(snapshot);
    }

    /// State for the status lines. Once a frame is on screen, loading is over
    /// even if the clock has not recorded it yet.
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.state.snapshot();
        if snapshot.phase == Phase::Loading {
            snapshot.phase = Phase::Playing;
        }
        snapshot
    }

    /// Make the inactive surface visible.
    fn swap(&mut self) -> io::Result<()> {
        self.active = 1 - self.active;
        self.surfaces[self.active].flush_to(&mut self.out)
    }
}

impl<S: FrameStore, W: Write> FrameSink for DisplayController<S, W> {
    fn present(&mut self, index: u64) -> io::Result<Presented> {
        let bytes = match self.store.read(index) {
            Ok(bytes) => bytes,
            Err(FrameStoreError::NotFound(_)) => return Ok(Presented::Missing),
            Err(e) => {
                tracing::warn!(index, error = %e, "failed to read frame");
                return Ok(Presented::Skipped);
            }
        };
        let frame = match Frame::decode(index, &bytes) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(index, error = %e, "failed to decode frame");
                return Ok(Presented::Skipped);
            }
        };

        self.compose(&frame);
        self.swap()?;
        Ok(Presented::Shown)
    }

    fn refresh(&mut self) -> io::Result<()> {
        let snapshot = self.snapshot();
        if self.last_status.is_none() || self.last_status == Some(snapshot) {
            return Ok(());
        }
        let (cols, _) = self.viewport.get();
        let row = u16::try_from(self.frame_lines).unwrap_or(u16::MAX);

        // only the status lines change; the frame stays frozen
        let surface = &mut self.surfaces[1 - self.active];
        surface.clear();
        surface.cursor_move(0, row);
        self.status.render_into(&snapshot, usize::from(cols), surface);
        surface.clear_below();
        self.last_status = Some(snapshot);
        self.swap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyBindings;
    use image::{ImageFormat, Rgb as Pixel, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    /// In-memory frame store.
    #[derive(Default)]
    struct MemoryStore {
        frames: HashMap<u64, Vec<u8>>,
    }

    impl MemoryStore {
        fn with_png(mut self, index: u64, width: u32, height: u32) -> Self {
            let image = RgbImage::from_pixel(width, height, Pixel([10, 20, 30]));
            let mut bytes = Cursor::new(Vec::new());
            image.write_to(&mut bytes, ImageFormat::Png).unwrap();
            self.frames.insert(index, bytes.into_inner());
            self
        }
    }

    impl FrameStore for MemoryStore {
        fn count(&self) -> io::Result<u64> {
            Ok(self.frames.len() as u64)
        }

        fn read(&self, index: u64) -> Result<Vec<u8>, FrameStoreError> {
            self.frames
                .get(&index)
                .cloned()
                .ok_or(FrameStoreError::NotFound(index))
        }
    }

    fn controller(
        store: MemoryStore,
        rows: u16,
    ) -> (DisplayController<MemoryStore, Vec<u8>>, Arc<PlaybackState>) {
        let state = Arc::new(PlaybackState::new(1));
        state.set_frame_count(10);
        let status = StatusBar::new(30, &KeyBindings::default());
        let display = DisplayController::new(
            store,
            Arc::clone(&state),
            Arc::new(Viewport::new(80, rows)),
            status,
            Vec::new(),
        );
        (display, state)
    }

    fn text(display: &DisplayController<MemoryStore, Vec<u8>>) -> String {
        String::from_utf8(display.output().clone()).unwrap()
    }

    #[test]
    fn test_viewport_packing() {
        let viewport = Viewport::new(320, 90);
        assert_eq!(viewport.get(), (320, 90));
        viewport.set(u16::MAX, 0);
        assert_eq!(viewport.get(), (u16::MAX, 0));
    }

    #[test]
    fn test_present_swaps_surfaces() {
        let store = MemoryStore::default().with_png(1, 4, 4).with_png(2, 4, 4);
        let (mut display, _) = controller(store, 24);

        assert_eq!(display.active_surface(), 0);
        assert_eq!(display.present(1).unwrap(), Presented::Shown);
        assert_eq!(display.active_surface(), 1);
        assert_eq!(display.present(2).unwrap(), Presented::Shown);
        assert_eq!(display.active_surface(), 0);
    }

    #[test]
    fn test_frame_is_composed_whole() {
        let store = MemoryStore::default().with_png(1, 4, 4);
        let (mut display, _) = controller(store, 24);
        display.present(1).unwrap();

        let out = text(&display);
        assert!(out.starts_with("\x1b[1;1H"));
        // 4 rows at stride 1 -> 2 frame lines, then the status lines
        assert_eq!(out.matches('▀').count(), 8);
        assert_eq!(out.matches("\r\n").count(), 2 + StatusBar::LINES);
        assert!(out.contains("0:00/0:00  stride 1"));
        assert!(out.ends_with("\x1b[J"));
    }

    #[test]
    fn test_frame_is_clipped_to_viewport() {
        let store = MemoryStore::default().with_png(1, 2, 40);
        let (mut display, _) = controller(store, 5);
        display.present(1).unwrap();
        // 5 rows - 2 status lines = 3 frame lines
        assert_eq!(text(&display).matches('▀').count(), 3 * 2);
    }

    #[test]
    fn test_missing_and_corrupt_frames() {
        let mut store = MemoryStore::default();
        store.frames.insert(2, b"not an image".to_vec());
        let (mut display, _) = controller(store, 24);

        assert_eq!(display.present(1).unwrap(), Presented::Missing);
        assert_eq!(display.present(2).unwrap(), Presented::Skipped);
        assert!(display.output().is_empty());
        assert_eq!(display.active_surface(), 0);
    }

    #[test]
    fn test_loading_screen() {
        let (mut display, _) = controller(MemoryStore::default(), 24);
        display.show_loading().unwrap();
        assert!(text(&display).contains(LOADING));
    }

    #[test]
    fn test_refresh_redraws_status_only_on_change() {
        let store = MemoryStore::default().with_png(1, 4, 4);
        let (mut display, state) = controller(store, 24);

        // nothing shown yet
        display.refresh().unwrap();
        assert!(display.output().is_empty());

        display.present(1).unwrap();
        let after_frame = display.output().len();
        display.refresh().unwrap();
        assert_eq!(display.output().len(), after_frame);

        state.toggle_pause();
        display.refresh().unwrap();
        let out = text(&display);
        let update = &out[after_frame..];
        assert!(update.starts_with("\x1b[3;1H"));
        assert!(update.contains("[paused]"));
        assert!(!update.contains('▀'));
    }
}
