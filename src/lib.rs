//! # Halfblock
//!
//! Plays video in the terminal as truecolor half-block art, in sync with its
//! audio, with pause, seek, and zoom controls.
//!
//! ## Core Concepts
//!
//! - **Half-block rendering**: each cell is two stacked pixels, the upper as
//!   the foreground of `▀`, the lower as its background
//! - **Double-buffered display**: frames are composed off screen and flushed
//!   in one write
//! - **Paced clock**: one loop advances the frame index at the frame rate,
//!   gated by pause and by how many frames the decoder has produced
//! - **Coarse A/V sync**: the audio cursor is snapped back to the video only
//!   when drift exceeds a tolerance
//! - **Actor model**: isolated threads for input, the clock, audio commands,
//!   and frame tracking
//!
//! ## Example
//!
//! ```rust,ignore
//! use halfblock::{render, Frame};
//!
//! let frame = Frame::open("still.png".as_ref())?;
//! print!("{}", render(&frame, 4));
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod audio;
pub mod buffer;
pub mod cancel;
pub mod config;
pub mod error;
pub mod external;
pub mod frame;
pub mod interrupt;
pub mod playback;
pub mod render;
pub mod terminal;
pub mod widget;

// Re-exports for convenience
pub use actor::{InputEvent, KeyCode, KeyModifiers, Player, TransportCommand};
pub use buffer::{Cell, CellFlags, GlyphLine, Rgb};
pub use cancel::CancelToken;
pub use config::{Action, KeyBinding, KeyBindings, PlayerConfig};
pub use error::{Error, Result};
pub use external::MediaKind;
pub use frame::{DirFrameStore, Frame, FrameStore};
pub use interrupt::Interrupt;
pub use playback::{PlaybackState, MAX_STRIDE, MIN_STRIDE};
pub use render::render;
