//! Terminal: escape-sequence output and terminal mode management.

mod output;

pub use output::{LineEnding, OutputBuffer};

use crossterm::{
    cursor, execute,
    terminal::{self, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Puts the terminal into playback mode and restores it on drop.
///
/// Playback mode is raw input, hidden cursor, no autowrap (frame lines wider
/// than the terminal are clipped instead of wrapping) and, optionally, the
/// alternate screen.
pub struct TerminalGuard {
    alternate_screen: bool,
}

impl TerminalGuard {
    /// Enter playback mode.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup fails (raw mode, alternate screen, etc.).
    pub fn enter(alternate_screen: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, drop restores whatever was enabled.
        let guard = Self { alternate_screen };

        let mut stdout = io::stdout();
        if alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        execute!(stdout, cursor::Hide, DisableLineWrap)?;
        Ok(guard)
    }

    /// Current terminal size as (columns, rows).
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnableLineWrap, cursor::Show);
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}
