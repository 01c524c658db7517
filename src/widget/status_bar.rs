//! Status Bar Widget: playback time, state, and key hints.
//!
//! Two lines drawn under the frame:
//!
//! ```text
//! 0:42/3:15  stride 7  [paused]
//! space pause  a/← back  d/→ forward  f zoom in  r zoom out  q/esc/^c quit
//! ```

use crate::actor::KeyCode;
use crate::buffer::Rgb;
use crate::config::{Action, KeyBinding, KeyBindings};
use crate::playback::{Phase, Snapshot};
use crate::terminal::OutputBuffer;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const STATUS_FG: Rgb = Rgb::WHITE;
const HINT_FG: Rgb = Rgb::new(150, 150, 150);

/// The status overlay under the video.
#[derive(Debug)]
pub struct StatusBar {
    frame_rate: u32,
    hints: String,
}

impl StatusBar {
    /// Lines the bar occupies.
    pub const LINES: usize = 2;

    /// Create a status bar for frames at `frame_rate` fps.
    pub fn new(frame_rate: u32, bindings: &KeyBindings) -> Self {
        Self {
            frame_rate: frame_rate.max(1),
            hints: key_hints(bindings),
        }
    }

    /// The key hint line.
    pub fn hints(&self) -> &str {
        &self.hints
    }

    /// The status line for a snapshot.
    pub fn status(&self, snapshot: &Snapshot) -> String {
        let fps = u64::from(self.frame_rate);
        let elapsed = snapshot.index.min(snapshot.frame_count.max(1)) / fps;
        let total = snapshot.frame_count / fps;

        let mut line = format!(
            "{}/{}  stride {}",
            format_clock(elapsed),
            format_clock(total),
            snapshot.stride
        );
        let marker = match snapshot.phase {
            Phase::Loading => Some("[loading]"),
            Phase::Paused => Some("[paused]"),
            Phase::Ended => Some("[ended]"),
            Phase::Playing | Phase::Quit => None,
        };
        if let Some(marker) = marker {
            line.push_str("  ");
            line.push_str(marker);
        }
        line
    }

    /// Draw both lines into `out`, clipped to `width` columns.
    pub fn render_into(&self, snapshot: &Snapshot, width: usize, out: &mut OutputBuffer) {
        out.set_fg(STATUS_FG);
        out.write_str(clip(&self.status(snapshot), width));
        out.end_line();

        out.set_fg(HINT_FG);
        out.write_str(clip(&self.hints, width));
        out.end_line();
    }
}

/// Format whole seconds as `m:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// The longest prefix of `text` that fits in `width` columns, cut at a
/// grapheme boundary.
pub fn clip(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut used = 0;
    let mut end = 0;
    for (offset, grapheme) in text.grapheme_indices(true) {
        let w = grapheme.width();
        if used + w > width {
            break;
        }
        used += w;
        end = offset + grapheme.len();
    }
    &text[..end]
}

fn key_label(key: KeyBinding) -> String {
    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Esc => "esc".to_string(),
    };
    if key.control {
        format!("^{name}")
    } else {
        name
    }
}

fn key_hints(bindings: &KeyBindings) -> String {
    const ACTIONS: [(Action, &str); 6] = [
        (Action::PauseToggle, "pause"),
        (Action::SeekBack, "back"),
        (Action::SeekForward, "forward"),
        (Action::ZoomIn, "zoom in"),
        (Action::ZoomOut, "zoom out"),
        (Action::Quit, "quit"),
    ];

    let mut hints = Vec::with_capacity(ACTIONS.len());
    for (action, label) in ACTIONS {
        let keys: Vec<String> = bindings.keys_for(action).map(key_label).collect();
        if !keys.is_empty() {
            hints.push(format!("{} {label}", keys.join("/")));
        }
    }
    hints.join("  ")
}
