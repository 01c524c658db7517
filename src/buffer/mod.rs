//! Buffer module: Cell-level data for half-block frames.
//!
//! This module contains:
//! - [`Cell`]: One terminal cell (foreground, background, glyph)
//! - [`Rgb`]: True-color representation
//! - [`CellFlags`]: Per-cell bitflags
//! - [`GlyphLine`]: One rendered row of cells

mod cell;

pub use cell::{Cell, CellFlags, Rgb, UPPER_HALF_BLOCK};

/// An ordered row of cells, covering two stacked source pixel rows.
pub type GlyphLine = Vec<Cell>;
