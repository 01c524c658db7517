//! Cell: One terminal cell of half-block art.
//!
//! # Memory Layout
//!
//! A frame at stride 1 can produce hundreds of thousands of cells, so the
//! `Cell` is kept small and `Copy`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  Cell Layout (12 bytes)                         │
//! ├───────────┬───────────┬───────────┬─────┬───────┤
//! │  glyph    │    fg     │    bg     │flags│  pad  │
//! │  char     │  [u8; 3]  │  [u8; 3]  │ u8  │  u8   │
//! └───────────┴───────────┴───────────┴─────┴───────┘
//! ```
//!
//! The upper source pixel becomes the foreground of an upper half block and
//! the lower source pixel becomes its background. When there is no lower
//! pixel the cell carries [`CellFlags::DEFAULT_BG`] and the background is left
//! to the terminal.

use bitflags::bitflags;

/// The glyph drawn for every frame cell: upper half filled with the
/// foreground color, lower half showing the background color.
pub const UPPER_HALF_BLOCK: char = '▀';

/// True-color RGB representation.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White (255, 255, 255)
    pub const WHITE: Self = Self::new(255, 255, 255);
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<image::Rgb<u8>> for Rgb {
    #[inline]
    fn from(pixel: image::Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::new(r, g, b)
    }
}

bitflags! {
    /// Cell-level flags.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Background is the terminal default, not `bg`.
        const DEFAULT_BG = 0b0000_0001;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// A single terminal cell: a (foreground, background, glyph) triple.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    glyph: char,
    fg: Rgb,
    bg: Rgb,
    flags: CellFlags,
}

// Compile-time assertion: keep cells small, there are a lot of them
const _: () = assert!(
    std::mem::size_of::<Cell>() <= 12,
    "Cell must stay within 12 bytes"
);

impl Cell {
    /// A half block sampled from two stacked pixels.
    #[inline]
    pub const fn half_block(upper: Rgb, lower: Rgb) -> Self {
        Self {
            glyph: UPPER_HALF_BLOCK,
            fg: upper,
            bg: lower,
            flags: CellFlags::empty(),
        }
    }

    /// A half block whose lower half falls outside the image.
    #[inline]
    pub const fn half_block_open(upper: Rgb) -> Self {
        Self {
            glyph: UPPER_HALF_BLOCK,
            fg: upper,
            bg: Rgb::BLACK,
            flags: CellFlags::DEFAULT_BG,
        }
    }

    /// The glyph drawn in this cell.
    #[inline]
    pub const fn glyph(&self) -> char {
        self.glyph
    }

    /// Foreground color.
    #[inline]
    pub const fn fg(&self) -> Rgb {
        self.fg
    }

    /// Background color, or `None` when the terminal default is used.
    #[inline]
    pub const fn bg(&self) -> Option<Rgb> {
        if self.flags.contains(CellFlags::DEFAULT_BG) {
            None
        } else {
            Some(self.bg)
        }
    }

    /// Cell flags.
    #[inline]
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("glyph", &self.glyph)
            .field("fg", &self.fg)
            .field("bg", &self.bg())
            .finish()
    }
}
