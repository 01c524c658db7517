//! Pixel-to-Glyph Renderer: turns a frame into truecolor half-block text.
//!
//! Each terminal cell shows two vertically stacked source pixels: the upper
//! one as the foreground of `▀`, the lower one as its background. Sampling
//! skips `stride` pixels horizontally and `2 * stride` rows vertically, so a
//! `W x H` frame becomes `ceil(H / 2s)` lines of `ceil(W / s)` cells.
//!
//! ```text
//!   x: 0     s     2s  ...
//! y=0   U     U     U        U = upper pixel  → foreground
//! y=s   L     L     L        L = lower pixel  → background
//! y=2s  U     U     U
//! y=3s  L     L     L
//! ```
//!
//! When the lower row of the last pair falls outside the image, the cell keeps
//! the terminal's default background instead of reading out of bounds.
//!
//! Rendering runs once per displayed frame, so the hot path writes straight
//! into one reusable [`OutputBuffer`] with no per-pixel allocation.

use crate::buffer::{Cell, GlyphLine, Rgb};
use crate::frame::Frame;
use crate::playback::MIN_STRIDE;
use crate::terminal::OutputBuffer;

/// Number of lines a `height`-pixel frame renders to at `stride`.
pub const fn line_count(height: u32, stride: u32) -> u32 {
    let step = 2 * effective_stride(stride);
    height.div_ceil(step)
}

/// Number of cells per line for a `width`-pixel frame at `stride`.
pub const fn cells_per_line(width: u32, stride: u32) -> u32 {
    width.div_ceil(effective_stride(stride))
}

const fn effective_stride(stride: u32) -> u32 {
    if stride < MIN_STRIDE {
        MIN_STRIDE
    } else {
        stride
    }
}

/// Render a frame to a string of newline-separated, color-reset-terminated
/// lines. An empty frame renders to an empty string.
pub fn render(frame: &Frame, stride: u32) -> String {
    let lines = line_count(frame.height(), stride) as usize;
    let cells = cells_per_line(frame.width(), stride) as usize;
    // ~40 bytes per cell with both colors changing
    let mut out = OutputBuffer::with_capacity(lines * (cells * 40 + 8));
    render_into(frame, stride, usize::MAX, &mut out);
    // Only ASCII escapes and `▀` are ever written.
    String::from_utf8(out.into_bytes()).unwrap_or_default()
}

/// Render a frame into `out`, emitting at most `max_lines` lines.
///
/// Returns the number of lines written.
pub fn render_into(frame: &Frame, stride: u32, max_lines: usize, out: &mut OutputBuffer) -> usize {
    let mut lines = 0;
    for_each_cell(frame, stride, max_lines, |event| match event {
        Sample::Cell(cell) => out.write_cell(&cell),
        Sample::EndOfLine => {
            out.end_line();
            lines += 1;
        }
    });
    lines
}

/// Render a frame into structured glyph lines.
pub fn glyph_lines(frame: &Frame, stride: u32) -> Vec<GlyphLine> {
    let mut lines = Vec::with_capacity(line_count(frame.height(), stride) as usize);
    let mut current = GlyphLine::with_capacity(cells_per_line(frame.width(), stride) as usize);
    for_each_cell(frame, stride, usize::MAX, |event| match event {
        Sample::Cell(cell) => current.push(cell),
        Sample::EndOfLine => lines.push(std::mem::take(&mut current)),
    });
    lines
}

enum Sample {
    Cell(Cell),
    EndOfLine,
}

fn for_each_cell(frame: &Frame, stride: u32, max_lines: usize, mut emit: impl FnMut(Sample)) {
    if frame.is_empty() {
        return;
    }

    let image = frame.image();
    let stride = effective_stride(stride);
    let (width, height) = image.dimensions();

    let mut y = 0;
    let mut lines = 0;
    while y < height && lines < max_lines {
        let lower_y = y + stride;
        let mut x = 0;
        while x < width {
            let upper = Rgb::from(*image.get_pixel(x, y));
            let cell = if lower_y < height {
                Cell::half_block(upper, Rgb::from(*image.get_pixel(x, lower_y)))
            } else {
                Cell::half_block_open(upper)
            };
            emit(Sample::Cell(cell));
            x += stride;
        }
        emit(Sample::EndOfLine);
        lines += 1;
        y += 2 * stride;
    }
}
