//! Game configuration: optional TOML file, overridden by command-line flags.
//!
//! ```toml
//! rows = 6
//! cols = 6
//! seed = 7
//! round_seconds = 120
//! level_goal = 100
//!
//! [scores]
//! milk = 10
//! apple = 10
//! orange = 15
//! ```
//!
//! When `[scores]` is present it is the token set; otherwise all seven types
//! are used with their default scores.

use crate::tokens::{TokenCatalog, TokenType};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub const MIN_BOARD_SIDE: usize = 3;
pub const MAX_BOARD_SIDE: usize = 12;
/// Fewer types than this cannot avoid runs on refill often enough to be playable.
pub const MIN_TOKEN_TYPES: usize = 3;
/// Upper bound for a configured token score.
pub const MAX_TOKEN_SCORE: u32 = 1_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("board {cols}x{rows} is too small (minimum side {MIN_BOARD_SIDE})")]
    BoardTooSmall { cols: usize, rows: usize },
    #[error("board {cols}x{rows} is too large (maximum side {MAX_BOARD_SIDE})")]
    BoardTooLarge { cols: usize, rows: usize },
    #[error("{0} token type(s) configured, at least {MIN_TOKEN_TYPES} needed")]
    TooFewTokenTypes(usize),
    #[error("score {score} for {token} is above the maximum of {MAX_TOKEN_SCORE}")]
    ScoreTooLarge { token: &'static str, score: u32 },
}

/// File layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    rows: Option<usize>,
    cols: Option<usize>,
    seed: Option<u64>,
    round_seconds: Option<u64>,
    level_goal: Option<u32>,
    scores: Option<BTreeMap<TokenType, u32>>,
}

/// Values from the command line that override the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub seed: Option<u64>,
    pub round_seconds: Option<u64>,
    pub level_goal: Option<u32>,
}

/// Settings the session and board are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub seed: Option<u64>,
    /// Countdown per level.
    pub round_seconds: u64,
    /// Goal for level 1; level n needs `level_goal * n`.
    pub level_goal: u32,
    pub catalog: TokenCatalog,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 6,
            seed: None,
            round_seconds: 120,
            level_goal: 100,
            catalog: TokenCatalog::standard(),
        }
    }
}

impl GameConfig {
    /// Read `path` (if any), apply `overrides`, validate.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                log::debug!("loaded config from {}", p.display());
                Self::from_toml(&text, overrides)
            }
            None => Self::from_file(ConfigFile::default(), overrides),
        }
    }

    /// Parse TOML text, apply `overrides`, validate.
    pub fn from_toml(text: &str, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::from_file(toml::from_str(text)?, overrides)
    }

    fn from_file(file: ConfigFile, overrides: &Overrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let catalog = match file.scores {
            Some(scores) => TokenCatalog::from_scores(scores),
            None => defaults.catalog,
        };
        let config = Self {
            rows: overrides.rows.or(file.rows).unwrap_or(defaults.rows),
            cols: overrides.cols.or(file.cols).unwrap_or(defaults.cols),
            seed: overrides.seed.or(file.seed),
            round_seconds: overrides
                .round_seconds
                .or(file.round_seconds)
                .unwrap_or(defaults.round_seconds)
                .max(1),
            level_goal: overrides
                .level_goal
                .or(file.level_goal)
                .unwrap_or(defaults.level_goal)
                .max(1),
            catalog,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (cols, rows) = (self.cols, self.rows);
        if cols < MIN_BOARD_SIDE || rows < MIN_BOARD_SIDE {
            return Err(ConfigError::BoardTooSmall { cols, rows });
        }
        if cols > MAX_BOARD_SIDE || rows > MAX_BOARD_SIDE {
            return Err(ConfigError::BoardTooLarge { cols, rows });
        }
        if self.catalog.len() < MIN_TOKEN_TYPES {
            return Err(ConfigError::TooFewTokenTypes(self.catalog.len()));
        }
        if let Some(t) = self.catalog.tokens().iter().find(|t| t.score > MAX_TOKEN_SCORE) {
            return Err(ConfigError::ScoreTooLarge {
                token: t.kind.name(),
                score: t.score,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::load(None, &Overrides::default()).unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!((config.cols, config.rows), (6, 6));
        assert_eq!(config.catalog.len(), 7);
    }

    #[test]
    fn test_parse_scores_and_dimensions() {
        let text = r#"
            rows = 8
            cols = 7
            level_goal = 250

            [scores]
            milk = 1
            apple = 2
            coconut = 3
        "#;
        let config = GameConfig::from_toml(text, &Overrides::default()).unwrap();
        assert_eq!((config.cols, config.rows), (7, 8));
        assert_eq!(config.level_goal, 250);
        assert_eq!(config.round_seconds, 120);
        assert_eq!(config.catalog.len(), 3);
        assert_eq!(config.catalog.token(TokenType::Coconut).map(|t| t.score), Some(3));
        assert_eq!(config.catalog.token(TokenType::Bread), None);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            rows: Some(9),
            seed: Some(4),
            ..Overrides::default()
        };
        let config = GameConfig::from_toml("rows = 5\nseed = 1", &overrides).unwrap();
        assert_eq!(config.rows, 9);
        assert_eq!(config.seed, Some(4));
    }

    #[test]
    fn test_rejects_bad_values() {
        let none = Overrides::default();
        assert!(matches!(
            GameConfig::from_toml("rows = 2", &none),
            Err(ConfigError::BoardTooSmall { .. })
        ));
        assert!(matches!(
            GameConfig::from_toml("cols = 40", &none),
            Err(ConfigError::BoardTooLarge { .. })
        ));
        assert!(matches!(
            GameConfig::from_toml("[scores]\nmilk = 1\napple = 1", &none),
            Err(ConfigError::TooFewTokenTypes(2))
        ));
        assert!(matches!(
            GameConfig::from_toml("[scores]\nbanana = 1", &none),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GameConfig::from_toml("speed = 3", &none),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_huge_scores() {
        let text = "[scores]\nmilk = 4000000000\napple = 4000000000\ncoconut = 1\n";
        assert!(matches!(
            GameConfig::from_toml(text, &Overrides::default()),
            Err(ConfigError::ScoreTooLarge { token: "Milk", score: 4_000_000_000 })
        ));
        let at_limit = format!("[scores]\nmilk = {MAX_TOKEN_SCORE}\napple = 1\ncoconut = 1\n");
        assert!(GameConfig::from_toml(&at_limit, &Overrides::default()).is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/definitely/not/here/swaptui.toml");
        assert!(matches!(
            GameConfig::load(Some(path), &Overrides::default()),
            Err(ConfigError::Io(_))
        ));
    }
}
