//! Widgets drawn around the video.

mod status_bar;

pub use status_bar::{clip, format_clock, StatusBar};
