//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::tokens::TokenType;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark token colours, indexed by `TokenType::color_index`.
const ONEDARK_TOKENS: [Color; 7] = [
    Color::Rgb(0xDC, 0xDF, 0xE4), // milk
    Color::Rgb(0xE0, 0x6C, 0x75), // apple / red
    Color::Rgb(0xD1, 0x9A, 0x66), // orange
    Color::Rgb(0xE5, 0xC0, 0x7B), // bread / yellow
    Color::Rgb(0x98, 0xC3, 0x79), // lettuce / green
    Color::Rgb(0x56, 0xB6, 0xC2), // coconut / cyan
    Color::Rgb(0xC6, 0x78, 0xDD), // carambola / magenta
];

const HIGH_CONTRAST_TOKENS: [Color; 7] = [
    Color::Rgb(0xFF, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0xFF, 0x88, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
];

/// Paul Tol's bright/vibrant sets: no red/green pair carries meaning on its own.
const COLORBLIND_TOKENS: [Color; 7] = [
    Color::Rgb(0xBB, 0xBB, 0xBB),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0xCC, 0xBB, 0x44),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x33, 0x77),
];

/// Theme file keys tried for each token colour, in `color_index` order.
const TOKEN_KEYS: [&[&str]; 7] = [
    &["milk", "selected_fg"],
    &["apple", "cpu_end", "temp_end"],
    &["orange", "temp_mid"],
    &["bread", "title", "cpu_mid"],
    &["lettuce", "mem_box", "cpu_start"],
    &["coconut", "hi_fg", "proc_misc"],
    &["carambola", "net_box"],
];

/// Token palette and UI colours loaded from a theme file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// One colour per token type.
    pub token: [Color; 7],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles, also the cursor.
    pub title: Color,
    /// Secondary text and the hint outline.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            token: ONEDARK_TOKENS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// No path means One Dark; `palette` then overrides the token colours.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            None => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// One Dark with `palette` applied.
    pub fn for_palette(palette: Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.token = HIGH_CONTRAST_TOKENS;
                self.bg = Color::Black;
                self.main_fg = Color::White;
            }
            Palette::Colorblind => self.token = COLORBLIND_TOKENS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let first = |keys: &[&str]| keys.iter().find_map(|&k| get(k));
        let defaults = Self::onedark_default();
        let mut token = defaults.token;
        for (slot, keys) in token.iter_mut().zip(TOKEN_KEYS) {
            if let Some(c) = first(keys) {
                *slot = c;
            }
        }
        Self {
            token,
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    #[inline]
    pub fn token_color(&self, kind: TokenType) -> Color {
        self.token[usize::from(kind.color_index()) % self.token.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').trim();
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    match s.len() {
        6 => Ok(Color::Rgb(channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
        3 => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}
