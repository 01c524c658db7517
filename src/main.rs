//! Halfblock entry point.
//!
//! Usage:
//!   halfblock <FILE> [OPTIONS]
//!
//! A still image is rendered once to stdout. Anything else is played as
//! video until `q`.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{cursor, execute, terminal};
use tracing_subscriber::EnvFilter;

use halfblock::{render, Frame, MediaKind, Player, PlayerConfig};

#[derive(Debug, Parser)]
#[command(
    name = "halfblock",
    version,
    about = "Play video as truecolor half-block art in the terminal"
)]
struct Cli {
    /// Video or image file to play.
    file: PathBuf,

    /// Sampling stride: 1 is full resolution, 10 the coarsest.
    #[arg(short, long, default_value_t = 7)]
    scale: u32,

    /// Frames per second to extract and play.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds moved by one seek key press.
    #[arg(long, default_value_t = 1.0)]
    seek_step: f64,

    /// Audio/video drift, in seconds, tolerated before the audio is re-synced.
    #[arg(long, default_value_t = 1.0)]
    drift_tolerance: f64,

    /// Play without sound.
    #[arg(long)]
    no_audio: bool,

    /// Write logs to this file (the terminal is busy during playback).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<PlayerConfig> {
        Ok(PlayerConfig {
            frame_rate: self.fps,
            initial_stride: self.scale,
            seek_step: seconds(self.seek_step, "--seek-step")?,
            drift_tolerance: seconds(self.drift_tolerance, "--drift-tolerance")?,
            audio: !self.no_audio,
            ..PlayerConfig::default()
        })
    }
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{flag} must be a non-negative number of seconds"))
}

/// Install the log subscriber. `RUST_LOG` overrides the default filter.
fn init_logging(log_file: Option<&Path>, stderr: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("halfblock=info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else if stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn show_still(path: &Path, stride: u32) -> Result<()> {
    let frame = Frame::open(path)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(render(&frame, stride).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let kind = MediaKind::detect(&cli.file)
        .with_context(|| format!("cannot read {}", cli.file.display()))?;

    if let MediaKind::Image(format) = kind {
        init_logging(cli.log_file.as_deref(), true)?;
        tracing::debug!(?format, "rendering still image");
        return show_still(&cli.file, halfblock::playback::clamp_stride(cli.scale));
    }

    init_logging(cli.log_file.as_deref(), false)?;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        bail!("video playback requires an interactive terminal");
    }

    // Restore the terminal before the panic message is printed.
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(
            io::stdout(),
            terminal::EnableLineWrap,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
        original_hook(panic_info);
    }));

    let player = Player::new(cli.config()?)?;
    player
        .play(&cli.file)
        .with_context(|| format!("failed to play {}", cli.file.display()))?;
    Ok(())
}
