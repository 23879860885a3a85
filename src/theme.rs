//! Colours: item shades per damage, UI colours from an optional btop-style theme file.

use crate::Palette;
use crate::item::{Item, ItemKind};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Item colours plus the UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Mikan colour per damage, fresh to fully spoiled.
    pub mikan: [Color; 4],
    /// Preservative colour per damage, intact to about to disappear.
    pub preservative: [Color; 5],
    pub spray: Color,
    /// Box background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (key hints).
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
    /// One Dark UI colours with ripe-to-mouldy mikans.
    pub fn onedark_default() -> Self {
        Self {
            mikan: [
                Color::from_u32(0x00F0_9030), // ripe
                Color::from_u32(0x00D1_9A66), // bruised
                Color::from_u32(0x00A0_8050), // soft
                Color::from_u32(0x0098_C379), // mouldy
            ],
            preservative: [
                Color::from_u32(0x0061_AFEF),
                Color::from_u32(0x0056_9CD6),
                Color::from_u32(0x004A_84B8),
                Color::from_u32(0x003E_6C96),
                Color::from_u32(0x005C_6370),
            ],
            spray: Color::from_u32(0x00E5_C07B),
            bg: Color::from_u32(0x0031_353F),
            div_line: Color::from_u32(0x003F_444F),
            main_fg: Color::from_u32(0x00AB_B2BF),
            title: Color::from_u32(0x00E5_C07B),
            inactive_fg: Color::from_u32(0x005C_6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// Item colours follow `palette`.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for_palette(palette: Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override item colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.mikan = [
                    Color::from_u32(0x00FF_8800),
                    Color::from_u32(0x00FF_FF00),
                    Color::from_u32(0x00FF_0000),
                    Color::from_u32(0x0000_FF00),
                ];
                self.preservative = [
                    Color::from_u32(0x0000_FFFF),
                    Color::from_u32(0x0000_CCFF),
                    Color::from_u32(0x0000_88FF),
                    Color::from_u32(0x0000_44FF),
                    Color::from_u32(0x00FF_FFFF),
                ];
                self.spray = Color::from_u32(0x00FF_FFFF);
            }
            Palette::Colorblind => {
                // avoid telling ripe from spoiled by red/green alone
                self.mikan = [
                    Color::from_u32(0x00EE_7733),
                    Color::from_u32(0x00BB_BB00),
                    Color::from_u32(0x00CC_3311),
                    Color::from_u32(0x0000_77BB),
                ];
                self.preservative = [
                    Color::from_u32(0x0000_9988),
                    Color::from_u32(0x0000_8877),
                    Color::from_u32(0x0000_7766),
                    Color::from_u32(0x0000_6655),
                    Color::from_u32(0x00EE_3377),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        Self {
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
            spray: get("hi_fg").unwrap_or(defaults.spray),
            ..defaults
        }
    }

    /// Colour of an item at its current damage.
    pub fn item_color(&self, item: &Item) -> Color {
        let damage = usize::from(item.damage());
        match item.kind() {
            ItemKind::Mikan => self.mikan[damage.min(self.mikan.len() - 1)],
            ItemKind::Preservative => self.preservative[damage.min(self.preservative.len() - 1)],
        }
    }
}

/// Collects `theme[key]=value` assignments; comments and other lines are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.strip_prefix("theme[")?.split_once(']')?;
            let value = value.trim().strip_prefix('=')?;
            let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
