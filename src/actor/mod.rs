//! Actor Model: Message-passing concurrency for the player.
//!
//! A small fixed set of threads, communicating through one bounded command
//! channel (UI → audio) and the shared [`PlaybackState`](crate::playback::PlaybackState):
//! - **Input Actor**: polls terminal events, forwards them to the main loop
//! - **Main Loop**: runs the [`Dispatcher`], the single input entry point, and
//!   watches for OS interrupts
//! - **Clock**: paces frames into the [`DisplayController`]
//! - **Audio Actor**: applies transport commands to the PCM stream
//! - **Poller / Extractor**: track frames as ffmpeg writes them
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  InputEvent   ┌──────────────┐ TransportCommand ┌─────────────┐
//! │ Input Thread │ ────────────▶ │  Main Loop   │ ───────────────▶ │ Audio Actor │
//! └──────────────┘               │ (Dispatcher) │                  └─────────────┘
//!                                └──────┬───────┘                         ▲
//!                                       │ pause / seek / zoom             │ corrective
//!                                       ▼                                 │ seek
//! ┌──────────────┐  frame_count  ┌──────────────┐      index       ┌─────┴───────┐
//! │    Poller    │ ────────────▶ │PlaybackState │ ◀──────────────▶ │    Clock    │
//! └──────────────┘               └──────────────┘                  │  + Display  │
//!                                                                  └─────────────┘
//! ```

mod dispatch;
mod display;
mod engine;
mod input;
mod messages;

pub use dispatch::{Dispatcher, Flow};
pub use display::{DisplayController, Viewport};
pub use engine::Player;
pub use input::InputActor;
pub use messages::{InputEvent, KeyCode, KeyModifiers, TransportCommand};
