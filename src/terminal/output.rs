//! `OutputBuffer`: Single-syscall output buffer for ANSI sequences.

use crate::buffer::{Cell, Rgb};
use std::io::Write;

const RESET: &[u8] = b"\x1b[0m";

/// How a finished line is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Plain `\n`, for text printed to a cooked terminal or a pipe.
    Newline,
    /// Clear to end of line, then `\r\n`. Raw mode does not return the
    /// carriage on `\n`, and a shorter line must erase the previous one.
    Raw,
}

/// Pre-allocated buffer for building ANSI escape sequences.
///
/// All output is accumulated here, then flushed in a single `write()` syscall
/// to prevent terminal flickering.
///
/// While writing cells, the buffer remembers the last emitted foreground and
/// background so runs of equal colors don't repeat their SGR sequence. The
/// pen is forgotten at every reset.
pub struct OutputBuffer {
    data: Vec<u8>,
    line_ending: LineEnding,
    pen_fg: Option<Rgb>,
    pen_bg: Option<Rgb>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            line_ending: LineEnding::Newline,
            pen_fg: None,
            pen_bg: None,
        }
    }

    /// Create a buffer sized for a typical terminal (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Create a buffer for a terminal in raw mode.
    pub fn raw(capacity: usize) -> Self {
        let mut buffer = Self::with_capacity(capacity);
        buffer.line_ending = LineEnding::Raw;
        buffer
    }

    /// The line ending in use.
    #[inline]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
        self.forget_pen();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its contents.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Move cursor to (x, y) position (1-indexed for ANSI).
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        // CSI row ; col H
        let _ = write!(self.data, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1);
    }

    /// Set foreground color (true color).
    #[inline]
    pub fn set_fg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b);
        self.pen_fg = Some(color);
    }

    /// Set background color (true color).
    #[inline]
    pub fn set_bg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[48;2;{};{};{}m", color.r, color.g, color.b);
        self.pen_bg = Some(color);
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(RESET);
        self.forget_pen();
    }

    /// Write one cell, emitting only the color changes it needs.
    #[inline]
    pub fn write_cell(&mut self, cell: &Cell) {
        match cell.bg() {
            Some(bg) => {
                if self.pen_bg != Some(bg) {
                    self.set_bg(bg);
                }
            }
            None => {
                if self.pen_bg.is_some() {
                    self.reset_attrs();
                }
            }
        }
        if self.pen_fg != Some(cell.fg()) {
            self.set_fg(cell.fg());
        }
        let mut utf8 = [0u8; 4];
        self.data
            .extend_from_slice(cell.glyph().encode_utf8(&mut utf8).as_bytes());
    }

    /// Finish a line: reset colors and terminate it.
    #[inline]
    pub fn end_line(&mut self) {
        self.reset_attrs();
        match self.line_ending {
            LineEnding::Newline => self.data.push(b'\n'),
            LineEnding::Raw => self.data.extend_from_slice(b"\x1b[K\r\n"),
        }
    }

    /// Clear from the cursor to the end of the screen.
    #[inline]
    pub fn clear_below(&mut self) {
        self.data.extend_from_slice(b"\x1b[J");
    }

    /// Clear the entire screen.
    #[inline]
    pub fn clear_screen(&mut self) {
        self.data.extend_from_slice(b"\x1b[2J");
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }

    const fn forget_pen(&mut self) {
        self.pen_fg = None;
        self.pen_bg = None;
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buffer: &OutputBuffer) -> String {
        String::from_utf8(buffer.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_write_cell_emits_both_colors() {
        let mut out = OutputBuffer::new();
        out.write_cell(&Cell::half_block(Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)));
        assert_eq!(text(&out), "\x1b[48;2;4;5;6m\x1b[38;2;1;2;3m▀");
    }

    #[test]
    fn test_repeated_colors_are_not_reemitted() {
        let mut out = OutputBuffer::new();
        let cell = Cell::half_block(Rgb::WHITE, Rgb::BLACK);
        out.write_cell(&cell);
        let first = out.len();
        out.write_cell(&cell);
        assert_eq!(out.len() - first, '▀'.len_utf8());
    }

    #[test]
    fn test_default_bg_resets_then_sets_fg() {
        let mut out = OutputBuffer::new();
        out.write_cell(&Cell::half_block(Rgb::WHITE, Rgb::BLACK));
        out.clear();
        out.write_cell(&Cell::half_block(Rgb::WHITE, Rgb::BLACK));
        out.write_cell(&Cell::half_block_open(Rgb::WHITE));
        let s = text(&out);
        assert!(s.ends_with("\x1b[0m\x1b[38;2;255;255;255m▀"));
    }

    #[test]
    fn test_end_line_newline() {
        let mut out = OutputBuffer::new();
        out.end_line();
        assert_eq!(text(&out), "\x1b[0m\n");
    }

    #[test]
    fn test_end_line_raw() {
        let mut out = OutputBuffer::raw(64);
        out.end_line();
        assert_eq!(text(&out), "\x1b[0m\x1b[K\r\n");
    }

    #[test]
    fn test_cursor_move_is_one_indexed() {
        let mut out = OutputBuffer::new();
        out.cursor_move(0, 0);
        assert_eq!(text(&out), "\x1b[1;1H");
    }
}
