//! Light/dark display themes. The chosen theme lives in its own slot,
//! independent of the task collection, and falls back to the terminal's
//! ambient preference when nothing was saved yet.

use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;

use crate::storage;
use crate::task::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                fg: Color::White,
                dim: Color::Gray,
                border: Color::DarkGray,
                accent: Color::Cyan,
                success: Color::Green,
                warning: Color::Yellow,
                danger: Color::Red,
            },
            Theme::Light => Palette {
                fg: Color::Black,
                dim: Color::DarkGray,
                border: Color::Gray,
                accent: Color::Blue,
                success: Color::Rgb(22, 128, 61),
                warning: Color::Rgb(161, 98, 7),
                danger: Color::Rgb(185, 28, 28),
            },
        }
    }
}

/// Colors the renderer draws with. Foreground-only so the terminal keeps
/// its own background.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Palette {
    pub fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::Low => self.success,
            Priority::Medium => self.warning,
            Priority::High => self.danger,
        }
    }
}

/// Saved choice, or the ambient terminal preference when no slot exists.
pub fn load(dir: &Path) -> Theme {
    fs::read_to_string(storage::theme_path(dir))
        .ok()
        .and_then(|data| serde_json::from_str(&data).ok())
        .unwrap_or_else(ambient)
}

pub fn save(dir: &Path, theme: Theme) -> std::io::Result<()> {
    fs::write(storage::theme_path(dir), format!("\"{}\"", theme.label()))
}

/// Closest thing a terminal has to `prefers-color-scheme`: the COLORFGBG
/// variable, "<fg>;<bg>", set by several emulators. Background 7 or 15
/// means a light terminal. Anything else, or no variable, reads as dark.
fn ambient() -> Theme {
    match std::env::var("COLORFGBG") {
        Ok(value) => match value.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()) {
            Some(7) | Some(15) => Theme::Light,
            _ => Theme::Dark,
        },
        Err(_) => Theme::Dark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_theme_round_trips() {
        let dir = TempDir::new().unwrap();
        save(dir.path(), Theme::Light).unwrap();
        assert_eq!(load(dir.path()), Theme::Light);
        save(dir.path(), Theme::Dark).unwrap();
        assert_eq!(load(dir.path()), Theme::Dark);
    }

    #[test]
    fn corrupt_slot_falls_back_to_ambient() {
        let dir = TempDir::new().unwrap();
        fs::write(storage::theme_path(dir.path()), "not json").unwrap();
        // Whatever ambient() says, load must not fail.
        let _ = load(dir.path());
    }

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
