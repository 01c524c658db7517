//! End-to-end playback against a frame directory, without a terminal.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use halfblock::actor::{DisplayController, Viewport};
use halfblock::audio::SharedStream;
use halfblock::config::KeyBindings;
use halfblock::external::Workspace;
use halfblock::playback::{ClockConfig, Cycle, Phase, PlaybackClock};
use halfblock::widget::StatusBar;
use halfblock::{CancelToken, DirFrameStore, FrameStore, PlaybackState};
use image::{ImageFormat, Rgb, RgbImage};

type Clock = PlaybackClock<DisplayController<DirFrameStore, Vec<u8>>, SharedStream>;

fn write_frame(dir: &Path, index: u64) {
    let shade = (index * 20 % 256) as u8;
    let image = RgbImage::from_pixel(8, 6, Rgb([shade, 0, 255 - shade]));
    image
        .save_with_format(dir.join(format!("{index}.jpg")), ImageFormat::Jpeg)
        .unwrap();
}

fn clock(store: DirFrameStore, state: &Arc<PlaybackState>, fps: u32) -> Clock {
    let display = DisplayController::new(
        store,
        Arc::clone(state),
        Arc::new(Viewport::new(80, 24)),
        StatusBar::new(fps, &KeyBindings::default()),
        Vec::new(),
    );
    PlaybackClock::new(
        Arc::clone(state),
        display,
        None,
        ClockConfig::for_frame_rate(fps, Duration::from_millis(5)),
        CancelToken::new(),
    )
}

fn output(clock: &Clock) -> String {
    String::from_utf8_lossy(clock.sink().output()).into_owned()
}

#[test]
fn test_plays_directory_to_the_end() {
    let workspace = Workspace::create().unwrap();
    for index in 1..=6 {
        write_frame(workspace.frames_dir(), index);
    }
    let store = DirFrameStore::new(workspace.frames_dir());
    let state = Arc::new(PlaybackState::new(1));
    state.finish_source(store.count().unwrap());

    let mut clock = clock(store, &state, 50);
    let start = Instant::now();
    let mut shown = Vec::new();
    loop {
        match clock.step() {
            Cycle::Advanced(index) => shown.push(index),
            Cycle::Ended => break,
            other => panic!("unexpected cycle {other:?}"),
        }
    }

    assert_eq!(shown, vec![1, 2, 3, 4, 5, 6]);
    // six frames at 20ms each
    assert!(start.elapsed() >= Duration::from_millis(110));
    assert_eq!(state.phase(), Phase::Ended);
    // 6 rows at stride 1 -> 3 lines of 8 cells per frame
    assert_eq!(output(&clock).matches('▀').count(), 6 * 3 * 8);

    workspace.cleanup().unwrap();
}

#[test]
fn test_waits_for_frames_still_being_extracted() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), 1);
    write_frame(dir.path(), 2);
    let store = DirFrameStore::new(dir.path());
    let state = Arc::new(PlaybackState::new(1));
    state.set_frame_count(store.count().unwrap());

    let mut clock = clock(store.clone(), &state, 200);
    assert_eq!(clock.step(), Cycle::Advanced(1));
    assert_eq!(clock.step(), Cycle::Advanced(2));
    assert_eq!(clock.step(), Cycle::Waiting);
    assert_eq!(state.index(), 3);

    write_frame(dir.path(), 3);
    state.finish_source(store.count().unwrap());
    assert_eq!(clock.step(), Cycle::Advanced(3));
    assert_eq!(clock.step(), Cycle::Ended);
}

#[test]
fn test_pause_and_seek_while_playing() {
    let dir = tempfile::tempdir().unwrap();
    for index in 1..=10 {
        write_frame(dir.path(), index);
    }
    let store = DirFrameStore::new(dir.path());
    let state = Arc::new(PlaybackState::new(1));
    state.finish_source(store.count().unwrap());

    let mut clock = clock(store, &state, 200);
    assert_eq!(clock.step(), Cycle::Advanced(1));

    state.toggle_pause();
    assert_eq!(clock.step(), Cycle::Paused);
    assert_eq!(clock.step(), Cycle::Paused);
    assert_eq!(state.index(), 2);
    assert!(output(&clock).contains("[paused]"));

    state.toggle_pause();
    state.seek_by(5);
    assert_eq!(clock.step(), Cycle::Advanced(7));
    state.seek_by(-100);
    assert_eq!(clock.step(), Cycle::Advanced(1));
}

#[test]
fn test_zoom_changes_rendered_resolution() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), 1);
    write_frame(dir.path(), 2);
    let store = DirFrameStore::new(dir.path());
    let state = Arc::new(PlaybackState::new(1));
    state.finish_source(store.count().unwrap());

    let mut clock = clock(store, &state, 200);
    assert_eq!(clock.step(), Cycle::Advanced(1));
    let full = output(&clock).matches('▀').count();

    state.adjust_stride(1);
    assert_eq!(clock.step(), Cycle::Advanced(2));
    let zoomed = output(&clock).matches('▀').count() - full;

    // 8x6 at stride 1 -> 3 lines of 8, at stride 2 -> 2 lines of 4
    assert_eq!(full, 24);
    assert_eq!(zoomed, 8);
}

#[test]
fn test_workspace_is_removed_after_cleanup() {
    let parent = tempfile::tempdir().unwrap();
    let workspace = Workspace::create_in(parent.path()).unwrap();
    let root = workspace.root().to_path_buf();
    write_frame(workspace.frames_dir(), 1);
    fs::write(workspace.audio_path(), b"RIFF").unwrap();

    workspace.cleanup().unwrap();
    assert!(!root.exists());
}
