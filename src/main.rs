//! Ochimikan: falling mikan matching puzzle in the terminal.

mod actor;
mod app;
mod cascade;
mod difficulty;
mod error;
mod highscores;
mod input;
mod item;
mod item_queue;
mod mikan_box;
mod scene;
mod search;
mod spray;
mod statistics;
mod surface;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Options derived from CLI that shape a game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub columns: usize,
    pub rows: usize,
    pub row_margin: usize,
    pub cell_size: u32,
    pub preview: usize,
    pub seed: Option<u64>,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            columns: args.columns,
            rows: args.rows,
            row_margin: args.row_margin,
            cell_size: args.cell_size,
            preview: args.preview,
            seed: args.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = setup_logging()?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        tracing::warn!(%err, "theme not loaded, using defaults");
        theme::Theme::default_for_palette(args.palette)
    });
    let config = GameConfig::from(&args);
    tracing::info!(?config, "starting");
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Logs to a file in the cache directory; the terminal belongs to the TUI.
fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "ochimikan.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/ochimikan.log", log_dir.display());
    Ok(guard)
}

/// `$XDG_CACHE_HOME/ochimikan/logs`, or `~/.cache/ochimikan/logs`.
fn log_directory() -> PathBuf {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("ochimikan").join("logs")
}

/// Falling mikan matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "ochimikan",
    version,
    about = "Falling mikan puzzle in the terminal. Chain four spoiled mikans to erase them.",
    long_about = "Ochimikan is a terminal puzzle game.\n\n\
        Mikans fall in pairs. Four or more fully spoiled mikans touching each other \
        erase; the items around them spoil one step. Preservatives shield nearby \
        mikans and disappear once fully spoiled.\n\n\
        CONTROLS:\n  Left/Right h/l  Move      Up/x/k     Rotate CW   z/u  Rotate CCW\n  \
        Enter/Space     Release   P          Pause       R    Restart    Q / Esc  Quit\n\n\
        Logs go to $XDG_CACHE_HOME/ochimikan/logs; set RUST_LOG to change the level."
)]
pub struct Args {
    /// Columns in the box.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub columns: usize,

    /// Visible rows in the box.
    #[arg(long, default_value = "12", value_name = "ROWS")]
    pub rows: usize,

    /// Invisible rows above the box where new pairs appear (at least 2).
    #[arg(long, default_value = "8", value_name = "ROWS")]
    pub row_margin: usize,

    /// Cell size in game pixels. Falling speeds are measured against it.
    #[arg(long, default_value = "32", value_name = "PX")]
    pub cell_size: u32,

    /// Game ticks per second.
    #[arg(long, default_value = "25.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Number of upcoming items shown in the sidebar.
    #[arg(long, default_value = "4", value_name = "N")]
    pub preview: usize,

    /// Seed for the item sequence; random if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the game-over fade.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
