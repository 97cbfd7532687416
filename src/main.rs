//! swaptui — match-three tile swapping puzzle in the terminal.

mod app;
mod board;
mod cascade;
mod config;
mod game;
mod grid;
mod input;
mod matcher;
mod rng;
mod theme;
mod tokens;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::{GameConfig, Overrides};
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = GameConfig::load(args.config.as_deref(), &args.overrides()).with_context(|| {
        match &args.config {
            Some(path) => format!("loading config {}", path.display()),
            None => "checking command-line settings".to_string(),
        }
    })?;
    log::debug!("config: {config:?}");
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded ({e}), using defaults");
        theme::Theme::for_palette(args.palette)
    });
    let mut app = App::new(&args, &config, theme)?;
    app.run()?;
    Ok(())
}

/// Match-three puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "swaptui",
    version,
    about = "Match-three tile swapping puzzle in the terminal. Swap neighbours to line up three or more.",
    long_about = "swaptui is a terminal match-three game.\n\n\
        Swap two neighbouring tokens to line up three or more of a kind. Matched tokens \
        vanish, the ones above fall, new ones drop in and chains keep scoring. Reach the \
        level goal before the clock runs out.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Space / Enter  Pick\n  ? / Tab        Hint          P              Pause\n  N              Next level    R              Restart\n  Q / Esc        Quit menu\n\n\
        Settings can come from a TOML file (--config); flags override it. \
        Set RUST_LOG=debug and redirect stderr to capture the engine log."
)]
pub struct Args {
    /// TOML config file (rows, cols, seed, round_seconds, level_goal, [scores]).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Board height in cells (3..=12). Default 6.
    #[arg(long, value_name = "ROWS")]
    pub rows: Option<usize>,

    /// Board width in cells (3..=12). Default 6.
    #[arg(long, value_name = "COLS")]
    pub cols: Option<usize>,

    /// Seed for the token generator; random if not set.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Countdown per level in seconds. Default 120.
    #[arg(long, value_name = "SECS")]
    pub round_seconds: Option<u64>,

    /// Points needed for level 1; level n needs n times this. Default 100.
    #[arg(long, value_name = "POINTS")]
    pub level_goal: Option<u32>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the flash on cleared cells.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            rows: self.rows,
            cols: self.cols,
            seed: self.seed,
            round_seconds: self.round_seconds,
            level_goal: self.level_goal,
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_overrides() {
        let args = Args::parse_from(["swaptui", "--rows", "8", "--seed", "5", "--palette", "contrast"]);
        let overrides = args.overrides();
        assert_eq!(overrides.rows, Some(8));
        assert_eq!(overrides.cols, None);
        assert_eq!(overrides.seed, Some(5));
        assert_eq!(args.palette, Palette::HighContrast);
        assert!(!args.no_animation);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
